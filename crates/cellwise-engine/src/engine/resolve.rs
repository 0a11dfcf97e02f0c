//! Recursive cell resolution with per-pass memoization and cycle detection.
//!
//! A formula cell is evaluated by walking its references depth-first. Two
//! pieces of state travel with that walk:
//!
//! - [`EvalCache`] memoizes every formula result computed during one
//!   evaluation pass, so a cell shared by many formulas is computed once.
//! - [`ActivePath`] holds the cells whose evaluation is still in progress.
//!   Meeting one of them again means the references loop back, and the cell
//!   reports `#CIRC!` instead of recursing.
//!
//! Both are plain values owned by the caller (or by an [`EvalPass`]); nothing
//! here is global, and neither survives a change to the sheet.
//!
//! `#CIRC!` travels back up a loop only until it reaches the cell whose
//! revisit closed that loop. Every cell in between gets `#CIRC!`; a formula
//! that merely reads one of them afterwards sees an ordinary error and
//! reports `#REF!`.
//!
//! At most [`MAX_EVAL_DEPTH`] nested cells are evaluated on one call stack.
//! When a chain goes deeper, the attempt is abandoned without caching
//! anything that depended on the cut, the deepest cell is evaluated on its
//! own (with its ancestors still counted as in progress), and the attempt is
//! retried. The cache then answers at the point the chain was cut.

use std::collections::{HashMap, HashSet};
use std::mem;

use tracing::{debug, trace};

use super::cell_ref::CellRef;
use super::value::{EvalValue, FormulaError};
use super::{expr, range};

/// Cell text starting with this character is a formula.
pub const FORMULA_SIGIL: char = '=';

/// Nested formula cells evaluated on one call stack before the rest of the
/// chain is finished separately.
pub const MAX_EVAL_DEPTH: usize = 256;

/// Read-only view of the raw cell text the engine evaluates.
///
/// Rows may have different lengths; anything outside them reads as absent.
pub trait SheetSource {
    /// Raw text of the cell, or `None` if it lies outside the sheet.
    fn raw(&self, at: &CellRef) -> Option<&str>;

    fn row_count(&self) -> usize;

    fn row_len(&self, row: usize) -> usize;
}

impl<S: AsRef<str>> SheetSource for [Vec<S>] {
    fn raw(&self, at: &CellRef) -> Option<&str> {
        self.get(at.row)?.get(at.col).map(|s| s.as_ref())
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_len(&self, row: usize) -> usize {
        self.get(row).map_or(0, |r| r.len())
    }
}

impl<S: AsRef<str>> SheetSource for Vec<Vec<S>> {
    fn raw(&self, at: &CellRef) -> Option<&str> {
        self.as_slice().raw(at)
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_len(&self, row: usize) -> usize {
        self.as_slice().row_len(row)
    }
}

/// Formula results computed so far in one evaluation pass.
#[derive(Clone, Debug, Default)]
pub struct EvalCache {
    values: HashMap<CellRef, EvalValue>,
    /// Loop-closing cell for entries cached while their loop was unwinding.
    cycles: HashMap<CellRef, CellRef>,
}

impl EvalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, at: &CellRef) -> Option<&EvalValue> {
        self.values.get(at)
    }

    pub fn contains(&self, at: &CellRef) -> bool {
        self.values.contains_key(at)
    }

    pub fn insert(&mut self, at: CellRef, value: EvalValue) {
        self.cycles.remove(&at);
        self.values.insert(at, value);
    }

    fn store(&mut self, at: CellRef, resolved: &Resolved) {
        match resolved.cycle {
            Some(root) => self.cycles.insert(at, root),
            None => self.cycles.remove(&at),
        };
        self.values.insert(at, resolved.value.clone());
    }

    fn lookup(&self, at: &CellRef) -> Option<Resolved> {
        let value = self.values.get(at)?.clone();
        let cycle = self.cycles.get(at).copied();
        Some(Resolved { value, cycle })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.cycles.clear();
    }
}

/// Cells currently mid-evaluation in the active call chain.
#[derive(Clone, Debug, Default)]
pub struct ActivePath {
    cells: HashSet<CellRef>,
}

impl ActivePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, at: &CellRef) -> bool {
        self.cells.contains(at)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

/// Evaluate raw cell text belonging to `at` and stringify the result.
///
/// Text without the leading `=` is returned unchanged. `cache` and `path`
/// are shared across the calls of one pass; `sheet` is never modified.
pub fn evaluate<S: SheetSource + ?Sized>(
    raw: &str,
    sheet: &S,
    cache: &mut EvalCache,
    at: CellRef,
    path: &mut ActivePath,
) -> String {
    evaluate_value(raw, sheet, cache, at, path).to_string()
}

/// Like [`evaluate`], but keeps the typed result.
pub fn evaluate_value<S: SheetSource + ?Sized>(
    raw: &str,
    sheet: &S,
    cache: &mut EvalCache,
    at: CellRef,
    path: &mut ActivePath,
) -> EvalValue {
    Resolver::new(sheet, cache, path).evaluate(raw, at)
}

/// Result of resolving one cell inside the walk.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Resolved {
    pub(crate) value: EvalValue,
    /// Set while the value belongs to a reference loop that is still being
    /// unwound: the cell whose revisit closed it.
    pub(crate) cycle: Option<CellRef>,
}

impl From<EvalValue> for Resolved {
    fn from(value: EvalValue) -> Self {
        Resolved { value, cycle: None }
    }
}

impl From<FormulaError> for Resolved {
    fn from(err: FormulaError) -> Self {
        EvalValue::Error(err).into()
    }
}

/// Cell at which an attempt was cut, with everything above it at that moment.
struct Deferred {
    cell: CellRef,
    ancestors: HashSet<CellRef>,
}

pub(crate) struct Resolver<'r, S: SheetSource + ?Sized> {
    pub(crate) sheet: &'r S,
    cache: &'r mut EvalCache,
    path: &'r mut ActivePath,
    /// Path entries inherited from earlier stack segments.
    frozen: usize,
    deferred: Option<Deferred>,
}

impl<'r, S: SheetSource + ?Sized> Resolver<'r, S> {
    fn new(sheet: &'r S, cache: &'r mut EvalCache, path: &'r mut ActivePath) -> Self {
        Resolver {
            sheet,
            cache,
            path,
            frozen: 0,
            deferred: None,
        }
    }

    fn evaluate(&mut self, raw: &str, at: CellRef) -> EvalValue {
        match raw.strip_prefix(FORMULA_SIGIL) {
            Some(body) => self.settle(|r| r.formula(body, at)),
            None => EvalValue::Text(raw.to_string()),
        }
    }

    fn evaluate_cell(&mut self, at: CellRef) -> EvalValue {
        self.settle(|r| r.resolve(at))
    }

    fn evaluate_detached(&mut self, raw: &str) -> EvalValue {
        match raw.strip_prefix(FORMULA_SIGIL) {
            Some(body) => self.settle(|r| r.body(body)),
            None => EvalValue::Text(raw.to_string()),
        }
    }

    /// Run `attempt` until it completes without being cut, finishing each
    /// deferred cell (deepest first) before retrying the one above it.
    fn settle(&mut self, mut attempt: impl FnMut(&mut Self) -> Resolved) -> EvalValue {
        let mut pending: Vec<Deferred> = Vec::new();
        loop {
            let outcome = match pending.last() {
                None => attempt(self),
                Some(cut) => {
                    let cell = cut.cell;
                    let outer = mem::replace(&mut self.path.cells, cut.ancestors.clone());
                    let frozen = mem::replace(&mut self.frozen, cut.ancestors.len());
                    let outcome = self.resolve(cell);
                    self.path.cells = outer;
                    self.frozen = frozen;
                    outcome
                }
            };
            match self.deferred.take() {
                Some(deeper) => pending.push(deeper),
                None => {
                    if pending.pop().is_none() {
                        return outcome.value;
                    }
                }
            }
        }
    }

    /// Evaluate the cell at `at`, reading its text from the sheet only when
    /// neither the cycle guard nor the cache can answer.
    pub(crate) fn resolve(&mut self, at: CellRef) -> Resolved {
        if let Some(hit) = self.guarded(&at) {
            return hit;
        }
        let sheet = self.sheet;
        let raw = sheet.raw(&at).unwrap_or("");
        match raw.strip_prefix(FORMULA_SIGIL) {
            Some(body) => self.compute(body, at),
            None => EvalValue::Text(raw.to_string()).into(),
        }
    }

    fn formula(&mut self, body: &str, at: CellRef) -> Resolved {
        match self.guarded(&at) {
            Some(hit) => hit,
            None => self.compute(body, at),
        }
    }

    fn guarded(&self, at: &CellRef) -> Option<Resolved> {
        if self.path.contains(at) {
            debug!(cell = %at, "circular reference");
            return Some(Resolved {
                value: FormulaError::Circular.into(),
                cycle: Some(*at),
            });
        }
        let mut hit = self.cache.lookup(at)?;
        // A loop whose closing cell has returned is over.
        hit.cycle = hit.cycle.filter(|root| self.path.contains(root));
        Some(hit)
    }

    fn compute(&mut self, body: &str, at: CellRef) -> Resolved {
        if self.deferred.is_some() {
            return FormulaError::Error.into();
        }
        if self.path.len() - self.frozen >= MAX_EVAL_DEPTH {
            debug!(cell = %at, depth = self.path.len(), "deferring deep reference chain");
            self.deferred = Some(Deferred {
                cell: at,
                ancestors: self.path.cells.clone(),
            });
            return FormulaError::Error.into();
        }
        trace!(cell = %at, formula = body, "evaluating");

        self.path.cells.insert(at);
        let mut resolved = self.body(body);
        self.path.cells.remove(&at);

        if resolved.cycle == Some(at) {
            resolved.cycle = None;
        }
        if self.deferred.is_none() {
            self.cache.store(at, &resolved);
        }
        resolved
    }

    fn body(&mut self, body: &str) -> Resolved {
        match range::match_sum(body) {
            Some(block) => range::sum(self, block).into(),
            None => expr::evaluate_expression(self, body),
        }
    }
}

/// Evaluation context for one pass over a sheet snapshot.
///
/// Owns the cache shared by every cell evaluated in the pass. Drop it (or
/// build a new one) whenever the sheet changes.
pub struct EvalPass<'a, S: SheetSource + ?Sized> {
    sheet: &'a S,
    cache: EvalCache,
    path: ActivePath,
}

impl<'a, S: SheetSource + ?Sized> EvalPass<'a, S> {
    pub fn new(sheet: &'a S) -> Self {
        EvalPass {
            sheet,
            cache: EvalCache::new(),
            path: ActivePath::new(),
        }
    }

    fn resolver(&mut self) -> Resolver<'_, S> {
        Resolver::new(self.sheet, &mut self.cache, &mut self.path)
    }

    /// Evaluate raw text as if it were stored at `at`.
    pub fn evaluate(&mut self, raw: &str, at: CellRef) -> EvalValue {
        let value = self.resolver().evaluate(raw, at);
        debug_assert!(self.path.is_empty());
        value
    }

    /// Evaluate raw text that is not stored anywhere in the sheet.
    ///
    /// The text has no address, so it never joins the active path and its
    /// result is not cached. Cells it reads are cached as usual.
    pub fn evaluate_detached(&mut self, raw: &str) -> EvalValue {
        let value = self.resolver().evaluate_detached(raw);
        debug_assert!(self.path.is_empty());
        value
    }

    /// Evaluate the cell stored at `at`.
    pub fn evaluate_cell(&mut self, at: CellRef) -> EvalValue {
        let value = self.resolver().evaluate_cell(at);
        debug_assert!(self.path.is_empty());
        value
    }

    /// Display text for the cell stored at `at`.
    pub fn display(&mut self, at: CellRef) -> String {
        self.evaluate_cell(at).to_string()
    }

    /// Display text for every cell, keeping the sheet's row lengths.
    pub fn display_grid(&mut self) -> Vec<Vec<String>> {
        let rows = self.sheet.row_count();
        debug!(rows, "evaluation pass started");
        let grid: Vec<Vec<String>> = (0..rows)
            .map(|row| {
                (0..self.sheet.row_len(row))
                    .map(|col| self.display(CellRef::new(row, col)))
                    .collect()
            })
            .collect();
        debug!(cached = self.cache.len(), "evaluation pass finished");
        grid
    }

    pub fn cache(&self) -> &EvalCache {
        &self.cache
    }

    pub fn active_path(&self) -> &ActivePath {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_literal_passes_through_without_caching() {
        let data = sheet(&[&["hello"]]);
        let mut cache = EvalCache::new();
        let mut path = ActivePath::new();
        let a1 = CellRef::new(0, 0);
        assert_eq!(evaluate("hello", &data, &mut cache, a1, &mut path), "hello");
        assert_eq!(evaluate("42", &data, &mut cache, a1, &mut path), "42");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cell_already_on_path_is_circular() {
        let data = sheet(&[&["=1+1"]]);
        let mut cache = EvalCache::new();
        let mut path = ActivePath::new();
        let a1 = CellRef::new(0, 0);
        path.cells.insert(a1);
        assert_eq!(evaluate("=1+1", &data, &mut cache, a1, &mut path), "#CIRC!");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_hit_skips_recompute() {
        let data = sheet(&[&["=1+1"]]);
        let mut cache = EvalCache::new();
        let mut path = ActivePath::new();
        let a1 = CellRef::new(0, 0);
        cache.insert(a1, EvalValue::Number(99.0));
        assert_eq!(evaluate("=1+1", &data, &mut cache, a1, &mut path), "99");
    }

    #[test]
    fn test_result_is_cached_and_path_restored() {
        let data = sheet(&[&["5", "=A1+1"]]);
        let mut cache = EvalCache::new();
        let mut path = ActivePath::new();
        let b1 = CellRef::new(0, 1);
        assert_eq!(evaluate("=A1+1", &data, &mut cache, b1, &mut path), "6");
        assert_eq!(cache.get(&b1), Some(&EvalValue::Number(6.0)));
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_restored_after_error() {
        let data = sheet(&[&["=1/0", "=A1+1"]]);
        let mut cache = EvalCache::new();
        let mut path = ActivePath::new();
        let b1 = CellRef::new(0, 1);
        assert_eq!(evaluate("=A1+1", &data, &mut cache, b1, &mut path), "#REF!");
        assert!(path.is_empty());
        assert_eq!(
            cache.get(&CellRef::new(0, 0)),
            Some(&EvalValue::Error(FormulaError::DivZero))
        );
    }

    /// `A{r}` holds `=A{r+1}+1` down to a literal `0` in the last row.
    fn chain(len: usize) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = (1..len).map(|r| vec![format!("=A{}+1", r + 1)]).collect();
        rows.push(vec!["0".to_string()]);
        rows
    }

    #[test]
    fn test_long_chain_in_display_grid() {
        let rows = chain(300);
        let mut pass = EvalPass::new(&rows);
        let grid = pass.display_grid();
        assert_eq!(grid[0][0], "299");
        assert_eq!(grid[99][0], "200");
        assert_eq!(grid[289][0], "10");
        assert!(pass.active_path().is_empty());

        let mut fresh = EvalPass::new(&rows);
        assert_eq!(fresh.display(CellRef::new(99, 0)), "200");
    }

    #[test]
    fn test_chain_deeper_than_one_stack_segment() {
        let rows = chain(4 * MAX_EVAL_DEPTH + 7);
        let mut pass = EvalPass::new(&rows);
        let expected = (4 * MAX_EVAL_DEPTH + 6).to_string();
        assert_eq!(pass.display(CellRef::new(0, 0)), expected);
        assert_eq!(pass.cache().len(), rows.len() - 1);
        assert!(pass.active_path().is_empty());
    }

    #[test]
    fn test_long_chain_through_free_evaluate() {
        let rows = chain(MAX_EVAL_DEPTH + 50);
        let mut cache = EvalCache::new();
        let mut path = ActivePath::new();
        let a1 = CellRef::new(0, 0);
        let expected = (MAX_EVAL_DEPTH + 49).to_string();
        assert_eq!(evaluate("=A2+1", &rows, &mut cache, a1, &mut path), expected);
        assert!(path.is_empty());
    }

    #[test]
    fn test_loop_longer_than_one_stack_segment() {
        let len = 2 * MAX_EVAL_DEPTH + 30;
        let mut rows: Vec<Vec<String>> = (1..len).map(|r| vec![format!("=A{}", r + 1)]).collect();
        rows.push(vec!["=A1".to_string()]);
        rows[0].push(format!("=A{}+1", len / 2));

        let mut pass = EvalPass::new(&rows);
        let grid = pass.display_grid();
        assert_eq!(grid[0], vec!["#CIRC!".to_string(), "#REF!".to_string()]);
        assert!(grid[1..].iter().all(|row| row[0] == "#CIRC!"));

        let mut fresh = EvalPass::new(&rows);
        assert_eq!(fresh.display(CellRef::new(0, 1)), "#REF!");
        assert_eq!(fresh.display(CellRef::new(len - 1, 0)), "#CIRC!");
        assert!(fresh.active_path().is_empty());
    }

    #[test]
    fn test_detached_formula_is_not_on_the_path() {
        let data = sheet(&[&["=A2"]]);
        let mut pass = EvalPass::new(&data);
        assert_eq!(pass.evaluate_detached("=A1+1"), EvalValue::Number(1.0));
        assert_eq!(pass.evaluate_detached("=SUM(A1:A2)"), EvalValue::Number(0.0));
        assert_eq!(pass.evaluate_detached("plain"), EvalValue::Text("plain".into()));
        assert_eq!(pass.cache().len(), 1);
        assert!(pass.active_path().is_empty());
    }

    #[test]
    fn test_display_grid_keeps_jagged_shape() {
        let data = sheet(&[&["1", "=A1*3"], &["=B1-A1"]]);
        let mut pass = EvalPass::new(&data);
        assert_eq!(
            pass.display_grid(),
            vec![vec!["1".to_string(), "3".to_string()], vec!["2".to_string()]]
        );
    }
}
