use cellwise_engine::engine::{CellRange, CellRef};

use super::Document;
use crate::error::{CellwiseError, Result};

impl Document {
    /// Raw text of a cell; empty when the cell lies outside the grid.
    pub fn get_cell(&self, cell_ref: &CellRef) -> &str {
        self.cells
            .get(cell_ref.row)
            .and_then(|row| row.get(cell_ref.col))
            .map_or("", String::as_str)
    }

    /// Store raw text in a cell, growing the grid if needed.
    pub fn set_cell(&mut self, cell_ref: CellRef, input: &str) -> Result<()> {
        let rows = cell_ref.row.checked_add(1);
        let cols = cell_ref.col.checked_add(1);
        let (Some(rows), Some(cols)) = (rows, cols) else {
            return Err(CellwiseError::InvalidCell(cell_ref.to_label()));
        };
        self.ensure_size(rows, cols);
        self.cells[cell_ref.row][cell_ref.col] = input.to_string();
        self.modified = true;
        Ok(())
    }

    pub fn clear_cell(&mut self, cell_ref: &CellRef) {
        if let Some(cell) = self
            .cells
            .get_mut(cell_ref.row)
            .and_then(|row| row.get_mut(cell_ref.col))
        {
            if !cell.is_empty() {
                cell.clear();
                self.modified = true;
            }
        }
    }

    /// Append a blank row as wide as the grid.
    pub fn add_row(&mut self) {
        let cols = self.cols();
        self.cells.push(vec![String::new(); cols]);
        self.modified = true;
    }

    /// Append a blank column to every row.
    pub fn add_col(&mut self) {
        for row in &mut self.cells {
            row.push(String::new());
        }
        self.modified = true;
    }

    /// Write a block of raw text with its top-left corner at `base`.
    /// Returns the range of cells the block covers.
    pub fn paste_block(&mut self, base: CellRef, block: &[Vec<String>]) -> Result<CellRange> {
        let width = block.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return Err(CellwiseError::InvalidRange("empty paste block".to_string()));
        }

        let past_end = base
            .row
            .checked_add(block.len())
            .zip(base.col.checked_add(width));
        let Some((rows, cols)) = past_end else {
            return Err(CellwiseError::InvalidRange(format!(
                "paste at {} does not fit in the grid",
                base.to_label()
            )));
        };
        let end = CellRef::new(rows - 1, cols - 1);
        self.ensure_size(rows, cols);
        for (rel_row, row) in block.iter().enumerate() {
            for (rel_col, text) in row.iter().enumerate() {
                self.cells[base.row + rel_row][base.col + rel_col] = text.clone();
            }
        }
        self.modified = true;
        Ok(CellRange::new(base, end))
    }

    /// Parse a cell label, e.g. from an address bar.
    pub fn cell_ref(label: &str) -> Result<CellRef> {
        CellRef::parse(label.trim()).ok_or_else(|| CellwiseError::InvalidCell(label.to_string()))
    }

    /// Parse a range such as `A1:C3`.
    pub fn range(text: &str) -> Result<CellRange> {
        CellRange::parse(text.trim()).ok_or_else(|| CellwiseError::InvalidRange(text.to_string()))
    }

    fn ensure_size(&mut self, rows: usize, cols: usize) {
        let cols = cols.max(self.cols());
        if self.cells.len() < rows {
            self.cells.resize(rows, Vec::new());
        }
        for row in &mut self.cells {
            if row.len() < cols {
                row.resize(cols, String::new());
            }
        }
    }
}
