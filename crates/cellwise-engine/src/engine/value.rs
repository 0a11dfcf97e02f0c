//! Typed evaluation results.
//!
//! Formula results stay typed while the engine works with them and are only
//! turned into text at the display boundary (see [`EvalValue`]'s `Display`).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::format::format_number;

/// Formula failures. Each one renders as a `#`-prefixed token in the cell.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaError {
    /// An operand is neither a number nor a cell holding one.
    #[error("#REF!")]
    Ref,
    /// Right-hand side of a division is exactly zero.
    #[error("#DIV/0!")]
    DivZero,
    /// The cell is already being evaluated further up the call chain.
    #[error("#CIRC!")]
    Circular,
    /// Anything else: malformed operator chains, overflow, depth limit.
    #[error("#ERROR!")]
    Error,
}

impl FormulaError {
    /// The display token, e.g. `#REF!`.
    pub fn token(&self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::DivZero => "#DIV/0!",
            FormulaError::Circular => "#CIRC!",
            FormulaError::Error => "#ERROR!",
        }
    }
}

/// The value of an evaluated cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EvalValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl EvalValue {
    /// Wrap a computed number, turning overflow into `#ERROR!`.
    pub fn from_number(n: f64) -> EvalValue {
        if n.is_finite() {
            EvalValue::Number(n)
        } else {
            EvalValue::Error(FormulaError::Error)
        }
    }

    /// Coerce to a number for use in arithmetic.
    ///
    /// Blank text counts as zero; any other non-numeric text and every error
    /// value is a reference failure.
    pub fn as_number(&self) -> Result<f64, FormulaError> {
        match self {
            EvalValue::Number(n) => Ok(*n),
            EvalValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(0.0)
                } else {
                    parse_number(s).ok_or(FormulaError::Ref)
                }
            }
            EvalValue::Error(_) => Err(FormulaError::Ref),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvalValue::Error(_))
    }
}

/// Parse a numeric literal. Only finite values count; `inf`/`nan` spellings
/// are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl fmt::Display for EvalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalValue::Number(n) => f.write_str(&format_number(*n)),
            EvalValue::Text(s) => f.write_str(s),
            EvalValue::Error(e) => f.write_str(e.token()),
        }
    }
}

impl From<FormulaError> for EvalValue {
    fn from(err: FormulaError) -> Self {
        EvalValue::Error(err)
    }
}

impl From<Result<f64, FormulaError>> for EvalValue {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => EvalValue::from_number(n),
            Err(e) => EvalValue::Error(e),
        }
    }
}
