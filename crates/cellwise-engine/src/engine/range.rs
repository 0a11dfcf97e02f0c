//! `SUM(<label>:<label>)` over a rectangular block of cells.

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::{CellRange, CellRef};
use super::resolve::{Resolver, SheetSource};
use super::value::EvalValue;

/// Regex that matches a whole formula body of the form `SUM(A1:B5)`.
///
/// Captures:
/// - group 1: first corner (e.g. `A1`)
/// - group 2: opposite corner (e.g. `B5`)
fn sum_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^SUM\(([A-Z]+[0-9]+):([A-Z]+[0-9]+)\)$")
            .expect("SUM range regex must compile")
    })
}

/// Recognize a range sum. Returns `None` when the body is anything else,
/// including a `SUM` whose corners are not valid labels.
pub(crate) fn match_sum(body: &str) -> Option<CellRange> {
    let caps = sum_call_re().captures(body)?;
    let start = CellRef::parse(&caps[1])?;
    let end = CellRef::parse(&caps[2])?;
    Some(CellRange::new(start, end))
}

/// Sum the block. Cells outside the sheet, non-numeric cells and cells that
/// evaluate to an error all count as zero.
pub(crate) fn sum<S: SheetSource + ?Sized>(
    resolver: &mut Resolver<'_, S>,
    block: CellRange,
) -> EvalValue {
    let sheet = resolver.sheet;
    let mut total = 0.0;

    let Some(last_row) = sheet.row_count().checked_sub(1) else {
        return EvalValue::Number(total);
    };
    for row in block.start.row..=block.end.row.min(last_row) {
        let Some(last_col) = sheet.row_len(row).checked_sub(1) else {
            continue;
        };
        for col in block.start.col..=block.end.col.min(last_col) {
            if let Ok(n) = resolver.resolve(CellRef::new(row, col)).value.as_number() {
                total += n;
            }
        }
    }

    EvalValue::from_number(total)
}
