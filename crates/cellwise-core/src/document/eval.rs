use cellwise_engine::engine::{CellRef, EvalPass, EvalValue, FORMULA_SIGIL};
use tracing::debug;

use super::Document;

impl Document {
    /// Display value of a single cell, from a fresh evaluation pass.
    pub fn display(&self, cell_ref: &CellRef) -> String {
        EvalPass::new(&self.cells).display(*cell_ref)
    }

    /// Display values for the whole grid, sharing one evaluation pass.
    pub fn display_grid(&self) -> Vec<Vec<String>> {
        debug!(rows = self.rows(), cols = self.cols(), "evaluating document");
        EvalPass::new(&self.cells).display_grid()
    }

    /// Evaluate a formula that is not stored in the grid.
    /// A missing leading `=` is added.
    pub fn evaluate_formula(&self, formula: &str) -> EvalValue {
        let formula = formula.trim();
        let raw = if formula.starts_with(FORMULA_SIGIL) {
            formula.to_string()
        } else {
            format!("{}{}", FORMULA_SIGIL, formula)
        };
        EvalPass::new(&self.cells).evaluate_detached(&raw)
    }

    /// Text for the address bar: the cell's label and its raw contents.
    pub fn address_bar(&self, cell_ref: &CellRef) -> String {
        format!("{}: {}", cell_ref.to_label(), self.get_cell(cell_ref))
    }
}
