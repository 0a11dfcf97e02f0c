//! Error types for Cellwise core.

use thiserror::Error;

/// Errors that can occur while loading, editing or exporting a document.
///
/// Formula problems are not errors here: they evaluate to `#` tokens.
#[derive(Error, Debug)]
pub enum CellwiseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("CSV file is empty")]
    EmptyCsv,
}

pub type Result<T> = std::result::Result<T, CellwiseError>;
