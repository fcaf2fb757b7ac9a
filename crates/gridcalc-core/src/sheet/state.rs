use crate::config::SheetConfig;
use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::{FormulaEngine, Grid, Position};
use std::collections::{BTreeMap, HashSet};

/// A single sheet: the owner of every cell and of every dependency edge.
///
/// Not safe for concurrent use: cell values are memoized through
/// single-threaded interior mutability.
pub struct Sheet {
    /// Sparse cell storage, including empty cells kept alive by references.
    pub(crate) grid: Grid,
    /// Compiles formula input.
    pub(crate) engine: FormulaEngine,
    /// Positions currently counted towards the printable size.
    pub(crate) occupied: HashSet<Position>,
    /// Occupied cell count per row.
    pub(crate) rows: BTreeMap<i32, usize>,
    /// Occupied cell count per column.
    pub(crate) cols: BTreeMap<i32, usize>,
}

impl Sheet {
    /// Create an empty sheet with default limits.
    pub fn new() -> Self {
        Self::with_config(&SheetConfig::default())
    }

    pub fn with_config(config: &SheetConfig) -> Self {
        Sheet {
            grid: Grid::new(),
            engine: FormulaEngine::with_limits(config.engine_limits()),
            occupied: HashSet::new(),
            rows: BTreeMap::new(),
            cols: BTreeMap::new(),
        }
    }

    /// Read-only access to the underlying cell storage.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of cell objects in storage, including referenced empty cells.
    pub fn cell_count(&self) -> usize {
        self.grid.len()
    }

    pub(crate) fn mark_occupied(&mut self, pos: Position) {
        if self.occupied.insert(pos) {
            *self.rows.entry(pos.row).or_default() += 1;
            *self.cols.entry(pos.col).or_default() += 1;
        }
    }

    pub(crate) fn unmark_occupied(&mut self, pos: Position) {
        if self.occupied.remove(&pos) {
            decrement(&mut self.rows, pos.row);
            decrement(&mut self.cols, pos.col);
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

fn decrement(counts: &mut BTreeMap<i32, usize>, key: i32) {
    if let Some(count) = counts.get_mut(&key) {
        *count -= 1;
        if *count == 0 {
            counts.remove(&key);
        }
    }
}

pub(crate) fn check_position(pos: Position) -> Result<()> {
    if pos.is_valid() {
        Ok(())
    } else {
        Err(GridcalcError::InvalidPosition(pos))
    }
}
