//! Markdown export functionality

use crate::document::Document;
use crate::error::Result;
use cellwise_engine::engine::CellRef;
use std::fmt::Write;
use std::path::Path;

/// Render the evaluated grid as a markdown table with column letters and
/// 1-based row numbers.
pub fn render_markdown(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str("# Sheet\n\n");

    if doc.is_empty() {
        out.push_str("*Empty spreadsheet*\n");
        return out;
    }

    let grid = doc.display_grid();
    let cols = grid.iter().map(Vec::len).max().unwrap_or(0);

    // Header with column letters
    out.push_str("|   |");
    for col in 0..cols {
        let _ = write!(out, " {} |", CellRef::col_to_letters(col));
    }
    out.push('\n');

    out.push_str("|---|");
    for _ in 0..cols {
        out.push_str("---|");
    }
    out.push('\n');

    for (row, values) in grid.iter().enumerate() {
        let _ = write!(out, "| {} |", row + 1);
        for col in 0..cols {
            let display = values.get(col).map_or("", String::as_str);
            let _ = write!(out, " {} |", escape_markdown(display));
        }
        out.push('\n');
    }

    out
}

/// Write the grid to a markdown file
pub fn write_markdown(path: &Path, doc: &Document) -> Result<()> {
    std::fs::write(path, render_markdown(doc))?;
    Ok(())
}

/// Escape special markdown characters in cell content
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_table() {
        let doc = Document::from_rows(vec![
            vec!["3".to_string(), "=A1*2".to_string()],
            vec!["a|b".to_string(), "=SUM(A1:B1)".to_string()],
        ]);
        let md = render_markdown(&doc);
        assert_eq!(
            md,
            "# Sheet\n\n|   | A | B |\n|---|---|---|\n| 1 | 3 | 6 |\n| 2 | a\\|b | 9 |\n"
        );
    }

    #[test]
    fn test_render_markdown_empty() {
        let md = render_markdown(&Document::default());
        assert!(md.contains("*Empty spreadsheet*"));
    }

    #[test]
    fn test_write_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.md");
        let doc = Document::from_rows(vec![vec!["=1+1".to_string()]]);
        write_markdown(&path, &doc).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("| 1 | 2 |"));
    }
}
