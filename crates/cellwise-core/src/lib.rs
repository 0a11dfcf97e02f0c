//! cellwise-core - UI-agnostic document model + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::Document;
pub use error::{CellwiseError, Result};

pub use cellwise_engine::engine::{CellRange, CellRef, EvalValue, FormulaError};
