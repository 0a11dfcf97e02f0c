//! Spreadsheet formula engine API.
//!
//! This module turns raw cell text into display values:
//!
//! - [`CellRef`], [`CellRange`] - Cell label parsing (A1 notation ↔ row/col indices)
//! - [`EvalValue`], [`FormulaError`] - Typed results and `#`-error tokens
//! - [`evaluate`], [`EvalPass`] - Recursive resolution with memoization and cycle guard
//! - [`SheetSource`] - Read-only access to the raw cell grid
//! - [`format_number`] - Number stringification for display

mod cell_ref;
mod expr;
mod format;
mod range;
mod resolve;
mod value;

pub use cell_ref::{CellRange, CellRef};
pub use format::format_number;
pub use resolve::{
    ActivePath, EvalCache, EvalPass, FORMULA_SIGIL, MAX_EVAL_DEPTH, SheetSource, evaluate,
    evaluate_value,
};
pub use value::{EvalValue, FormulaError, parse_number};
