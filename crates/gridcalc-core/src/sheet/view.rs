//! Handles to individual cells of a [`Sheet`].

use super::Sheet;
use crate::error::Result;
use gridcalc_engine::engine::{Cell, CellLookup, CellValue, Grid, Position};

/// Read-only handle to a cell that exists in a sheet.
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    grid: &'a Grid,
    pos: Position,
}

impl<'a> CellView<'a> {
    pub(crate) fn new(grid: &'a Grid, pos: Position) -> Self {
        CellView { grid, pos }
    }

    fn cell(&self) -> Option<&'a Cell> {
        self.grid.get(&self.pos)
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// The computed value, evaluated lazily and memoized.
    pub fn value(&self) -> CellValue {
        self.grid.value_at(self.pos).unwrap_or_default()
    }

    /// The input text: a literal or `=<expression>`, never the value.
    pub fn text(&self) -> String {
        self.cell().map(Cell::text).unwrap_or_default()
    }

    /// Positions this cell's formula reads, in order of first occurrence.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.cell().map(Cell::referenced_cells).unwrap_or_default()
    }

    /// Positions of the formulas that read this cell, in row-major order.
    pub fn dependents(&self) -> Vec<Position> {
        let mut dependents: Vec<Position> = self
            .cell()
            .map(|cell| cell.dependents().collect())
            .unwrap_or_default();
        dependents.sort();
        dependents
    }

    pub fn is_referenced(&self) -> bool {
        self.cell().is_some_and(Cell::is_referenced)
    }

    pub fn is_empty(&self) -> bool {
        self.cell().is_none_or(Cell::is_empty)
    }

    /// True if the value is memoized and will not be recomputed on read.
    pub fn is_cached(&self) -> bool {
        self.cell().is_some_and(Cell::is_cached)
    }
}

/// Mutable handle to a cell that exists in a sheet.
///
/// Writes go through the sheet, so they get the same validation, cycle
/// checks and invalidation as [`Sheet::set_cell`].
pub struct CellViewMut<'a> {
    sheet: &'a mut Sheet,
    pos: Position,
}

impl<'a> CellViewMut<'a> {
    pub(crate) fn new(sheet: &'a mut Sheet, pos: Position) -> Self {
        CellViewMut { sheet, pos }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn set(&mut self, text: &str) -> Result<()> {
        self.sheet.set_cell(self.pos, text)
    }

    /// Clear the cell. The handle is consumed because the cell may be removed.
    pub fn clear(self) -> Result<()> {
        self.sheet.clear_cell(self.pos)
    }

    pub fn as_view(&self) -> CellView<'_> {
        CellView::new(&self.sheet.grid, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use crate::Sheet;
    use gridcalc_engine::engine::{CellValue, Position};

    fn pos(name: &str) -> Position {
        Position::from_str(name).unwrap()
    }

    #[test]
    fn test_missing_cell_has_no_view() {
        let sheet = Sheet::new();
        assert!(sheet.cell(pos("A1")).unwrap().is_none());
    }

    #[test]
    fn test_mutable_view_updates_dependents() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "2").unwrap();
        sheet.set_cell(pos("B1"), "=A1 * A1").unwrap();
        assert_eq!(
            sheet.cell(pos("B1")).unwrap().unwrap().value(),
            CellValue::Number(4.0)
        );

        let mut a1 = sheet.cell_mut(pos("A1")).unwrap().unwrap();
        a1.set("3").unwrap();
        assert_eq!(a1.as_view().text(), "3");

        assert_eq!(
            sheet.cell(pos("B1")).unwrap().unwrap().value(),
            CellValue::Number(9.0)
        );
    }

    #[test]
    fn test_mutable_view_clear_removes_unreferenced_cell() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "x").unwrap();
        sheet.cell_mut(pos("A1")).unwrap().unwrap().clear().unwrap();
        assert!(sheet.cell(pos("A1")).unwrap().is_none());
    }

    #[test]
    fn test_dependents_are_sorted() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("C2"), "=A1").unwrap();
        sheet.set_cell(pos("B1"), "=A1").unwrap();
        sheet.set_cell(pos("A2"), "=A1").unwrap();
        let a1 = sheet.cell(pos("A1")).unwrap().unwrap();
        assert!(a1.is_referenced());
        assert_eq!(a1.dependents(), vec![pos("B1"), pos("A2"), pos("C2")]);
    }
}
