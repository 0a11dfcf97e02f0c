use super::Document;
use crate::error::{CellwiseError, Result};
use crate::storage::{parse_csv, write_csv, write_markdown};
use std::path::Path;
use tracing::info;

impl Document {
    /// Load a document from a CSV file of raw cell text.
    pub fn load_csv(path: &Path) -> Result<Self> {
        let rows = parse_csv(path)?;
        if rows.is_empty() {
            return Err(CellwiseError::EmptyCsv);
        }
        let mut doc = Document::from_rows(rows);
        doc.file_path = Some(path.to_path_buf());
        info!(path = %path.display(), rows = doc.rows(), cols = doc.cols(), "loaded sheet");
        Ok(doc)
    }

    /// Export evaluated values to CSV.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        write_csv(path, self)?;
        info!(path = %path.display(), "exported csv");
        Ok(())
    }

    /// Export evaluated values as a markdown table.
    pub fn export_markdown(&self, path: &Path) -> Result<()> {
        write_markdown(path, self)?;
        info!(path = %path.display(), "exported markdown");
        Ok(())
    }
}
