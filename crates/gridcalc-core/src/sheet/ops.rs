use super::state::check_position;
use super::{CellView, CellViewMut, Sheet};
use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::{CellContent, Position, Size, commit_content, detect_cycle};
use tracing::{debug, warn};

impl Sheet {
    /// Set cell contents from input text.
    ///
    /// Input equal to the cell's current text is a no-op for the dependency
    /// graph and the caches. A formula that does not compile or that would
    /// close a cycle is rejected before anything is modified. Empty cells
    /// created for the formula's references count towards the printable size.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        check_position(pos)?;

        let unchanged = self.grid.get(&pos).is_some_and(|cell| cell.text() == text);
        if !unchanged {
            let content = CellContent::from_input(text, &self.engine)?;

            if let Some(path) = detect_cycle(&self.grid, pos, content.referenced_cells()) {
                warn!(cell = %pos, text, "rejected formula with circular dependency");
                return Err(GridcalcError::CircularDependency { cell: pos, path });
            }

            let report = commit_content(&mut self.grid, pos, content);
            for &created in &report.created {
                self.mark_occupied(created);
            }
            debug!(
                cell = %pos,
                text,
                created = report.created.len(),
                invalidated = report.invalidated,
                "set cell"
            );
        }

        self.mark_occupied(pos);
        Ok(())
    }

    /// Clear the specified cell.
    ///
    /// A cell that no formula reads is removed from storage. A cell that is
    /// still read is kept as an empty cell so its dependents stay wired.
    /// Either way the position stops counting towards the printable size.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        check_position(pos)?;

        let Some(cell) = self.grid.get(&pos) else {
            return Ok(());
        };
        let referenced = cell.is_referenced();
        let already_empty = cell.is_empty();

        if !already_empty {
            commit_content(&mut self.grid, pos, CellContent::Empty);
        }
        if !referenced {
            self.grid.remove(&pos);
            debug!(cell = %pos, "removed cell");
        } else {
            debug!(cell = %pos, "cleared referenced cell");
        }

        self.unmark_occupied(pos);
        Ok(())
    }

    /// Read access to the cell at `pos`, or `None` if no cell exists there.
    pub fn cell(&self, pos: Position) -> Result<Option<CellView<'_>>> {
        check_position(pos)?;
        Ok(self
            .grid
            .contains_key(&pos)
            .then(|| CellView::new(&self.grid, pos)))
    }

    /// Write access to the cell at `pos`, or `None` if no cell exists there.
    pub fn cell_mut(&mut self, pos: Position) -> Result<Option<CellViewMut<'_>>> {
        check_position(pos)?;
        if !self.grid.contains_key(&pos) {
            return Ok(None);
        }
        Ok(Some(CellViewMut::new(self, pos)))
    }

    /// Smallest bounding box containing every occupied position.
    pub fn printable_size(&self) -> Size {
        match (self.rows.last_key_value(), self.cols.last_key_value()) {
            (Some((&row, _)), Some((&col, _))) => Size::new(row + 1, col + 1),
            _ => Size::default(),
        }
    }
}
