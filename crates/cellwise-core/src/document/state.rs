use std::path::PathBuf;

/// Rows in a blank document.
pub const DEFAULT_ROWS: usize = 20;
/// Columns in a blank document.
pub const DEFAULT_COLS: usize = 10;

/// UI-agnostic document state for the spreadsheet.
///
/// Cells hold the raw text the user typed; formulas are only evaluated on
/// demand, in a fresh pass over the current contents.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Raw cell text, row-major. Kept rectangular.
    pub cells: Vec<Vec<String>>,
    /// File the document was loaded from, if any.
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified since it was created or loaded.
    pub modified: bool,
}

impl Document {
    /// Create a blank `rows` x `cols` document.
    pub fn new(rows: usize, cols: usize) -> Self {
        Document {
            cells: vec![vec![String::new(); cols]; rows],
            file_path: None,
            modified: false,
        }
    }

    /// Build a document from possibly jagged rows, padding short rows with
    /// empty cells.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Document {
            cells: rows,
            file_path: None,
            modified: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(String::is_empty)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dimensions() {
        let doc = Document::default();
        assert_eq!(doc.rows(), DEFAULT_ROWS);
        assert_eq!(doc.cols(), DEFAULT_COLS);
        assert!(doc.is_empty());
        assert!(!doc.modified);
    }

    #[test]
    fn test_from_rows_pads_jagged_input() {
        let doc = Document::from_rows(vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string(), "d".to_string()],
        ]);
        assert_eq!(doc.cols(), 3);
        assert_eq!(doc.cells[0], vec!["a", "", ""]);
        assert!(!doc.is_empty());
    }
}
