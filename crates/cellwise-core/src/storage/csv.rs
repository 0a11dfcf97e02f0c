//! CSV import/export functionality

use crate::document::Document;
use crate::error::{CellwiseError, Result};
use std::path::Path;

/// Read a CSV file into rows of raw cell text.
pub fn parse_csv(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = std::fs::read_to_string(path)?;
    parse_csv_str(&content)
}

/// Parse CSV text into rows of raw cell text. Formulas are kept as typed
/// (`=A1+1`), not evaluated.
pub fn parse_csv_str(content: &str) -> Result<Vec<Vec<String>>> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            parse_csv_line(line).ok_or_else(|| CellwiseError::Parse {
                line: idx + 1,
                message: "unterminated quoted field".to_string(),
            })
        })
        .collect()
}

/// Parse a single CSV line, handling quoted fields.
/// Returns `None` if a quoted field is never closed.
pub(crate) fn parse_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                }
                ',' => {
                    fields.push(finish_field(&mut current, field_was_quoted));
                    field_was_quoted = false;
                }
                _ => current.push(c),
            }
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(finish_field(&mut current, field_was_quoted));
    Some(fields)
}

fn finish_field(current: &mut String, quoted: bool) -> String {
    let field = std::mem::take(current);
    if quoted {
        field
    } else {
        field.trim().to_string()
    }
}

/// Render evaluated display values as CSV text.
pub fn render_csv(doc: &Document) -> String {
    let mut out = String::new();
    for row in doc.display_grid() {
        let fields: Vec<String> = row.iter().map(|f| escape_csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Export the document's evaluated display values to a CSV file.
pub fn write_csv(path: &Path, doc: &Document) -> Result<()> {
    std::fs::write(path, render_csv(doc))?;
    Ok(())
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    // Guard against CSV formula injection in spreadsheet apps.
    let first_non_space = field.trim_start_matches([' ', '\t']).chars().next();
    let safe_field = if matches!(first_non_space, Some('=' | '+' | '@')) {
        format!("'{}", field)
    } else {
        field.to_string()
    };

    if safe_field.contains(',')
        || safe_field.contains('"')
        || safe_field.contains('\n')
        || safe_field.contains('\r')
    {
        format!("\"{}\"", safe_field.replace('"', "\"\""))
    } else {
        safe_field
    }
}
