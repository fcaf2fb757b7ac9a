//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellContent`] - What the user entered (empty, text, or a formula)
//! - [`CellValue`] - What a cell evaluates to
//! - [`Cell`] - Content plus the memoized value and both dependency edge sets
//! - [`Grid`] - Sparse storage for cells, keyed by position

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::eval::{CellLookup, ESCAPE_SIGN, FORMULA_SIGN, Formula, FormulaEngine, FormulaError, SyntaxError};
use super::position::Position;

/// Sparse cell storage. A missing key is an empty, unreferenced cell.
pub type Grid = HashMap<Position, Cell>;

/// The computed result of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

/// The content stored in a cell.
#[derive(Clone, Debug, Default)]
pub enum CellContent {
    #[default]
    Empty,
    Text(String),
    Formula(Formula),
}

impl CellContent {
    /// Classify user input.
    /// - Empty string -> Empty
    /// - `=` followed by anything -> Formula (compiled, without the `=`)
    /// - Otherwise -> Text, verbatim (a lone `=` is text)
    pub fn from_input(input: &str, engine: &FormulaEngine) -> Result<CellContent, SyntaxError> {
        if input.is_empty() {
            return Ok(CellContent::Empty);
        }
        if let Some(expression) = input.strip_prefix(FORMULA_SIGN)
            && !expression.is_empty()
        {
            return engine.compile(expression).map(CellContent::Formula);
        }
        Ok(CellContent::Text(input.to_string()))
    }

    /// The text a user would see when editing the cell.
    pub fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(text) => text.clone(),
            CellContent::Formula(formula) => format!("{}{}", FORMULA_SIGN, formula.expression()),
        }
    }

    /// Positions this content reads. Only formulas read other cells.
    pub fn referenced_cells(&self) -> &[Position] {
        match self {
            CellContent::Formula(formula) => formula.referenced_cells(),
            CellContent::Empty | CellContent::Text(_) => &[],
        }
    }

    fn compute(&self, lookup: &dyn CellLookup) -> CellValue {
        match self {
            CellContent::Empty => CellValue::Text(String::new()),
            CellContent::Text(text) => {
                let shown = text.strip_prefix(ESCAPE_SIGN).unwrap_or(text);
                CellValue::Text(shown.to_string())
            }
            CellContent::Formula(formula) => match formula.evaluate(lookup) {
                Ok(n) => CellValue::Number(n),
                Err(err) => CellValue::Error(err),
            },
        }
    }
}

/// Memoized value of a cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CacheState {
    Fresh(CellValue),
    #[default]
    Stale,
}

/// A cell in the spreadsheet grid.
///
/// A cell does not know its own position; it is addressed through the
/// [`Grid`] that owns it, and its edges are positions in that grid.
///
/// The value cache uses single-threaded interior mutability so that values
/// can be computed through a shared reference. A `Cell` is not `Sync`.
#[derive(Clone, Debug, Default)]
pub struct Cell {
    pub(crate) content: CellContent,
    pub(crate) cache: RefCell<CacheState>,
    /// Cells this cell's formula reads.
    pub(crate) depends_on: HashSet<Position>,
    /// Cells whose formulas read this cell.
    pub(crate) dependents: HashSet<Position>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    /// Positions the formula reads, deduplicated, in order of first occurrence.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.content.referenced_cells().to_vec()
    }

    /// True if any formula reads this cell.
    pub fn is_referenced(&self) -> bool {
        !self.dependents.is_empty()
    }

    pub fn depends_on(&self) -> impl Iterator<Item = Position> + '_ {
        self.depends_on.iter().copied()
    }

    pub fn dependents(&self) -> impl Iterator<Item = Position> + '_ {
        self.dependents.iter().copied()
    }

    /// True if the value is memoized.
    pub fn is_cached(&self) -> bool {
        matches!(*self.cache.borrow(), CacheState::Fresh(_))
    }

    /// The cell's value, computing and memoizing it if the cache is stale.
    ///
    /// Reads through [`Grid::value_at`](CellLookup::value_at) fill stale
    /// dependencies first; calling this directly on a deep stale chain recurses.
    pub fn value(&self, lookup: &dyn CellLookup) -> CellValue {
        if let CacheState::Fresh(value) = &*self.cache.borrow() {
            return value.clone();
        }

        let value = self.content.compute(lookup);
        trace!(text = %self.text(), ?value, "recomputed cell value");
        *self.cache.borrow_mut() = CacheState::Fresh(value.clone());
        value
    }

    pub(crate) fn reset_cache(&mut self) {
        *self.cache.get_mut() = CacheState::Stale;
    }
}

impl CellLookup for Grid {
    fn value_at(&self, pos: Position) -> Option<CellValue> {
        let cell = self.get(&pos)?;
        fill_stale_dependencies(self, pos);
        Some(cell.value(self))
    }
}

/// Compute every stale cell that `start` transitively reads, dependencies
/// before dependents, so that evaluating `start` only reads fresh caches.
///
/// Uses an explicit stack: a long chain of formulas must not grow the call
/// stack with its length.
fn fill_stale_dependencies(grid: &Grid, start: Position) {
    let is_stale = |pos: &Position| grid.get(pos).is_some_and(|cell| !cell.is_cached());
    if !is_stale(&start) {
        return;
    }

    let mut visited: HashSet<Position> = HashSet::new();
    // (position, dependencies already pushed)
    let mut stack = vec![(start, false)];

    while let Some((pos, expanded)) = stack.pop() {
        let Some(cell) = grid.get(&pos) else {
            continue;
        };
        if expanded {
            if pos != start {
                cell.value(grid);
            }
            continue;
        }
        if !visited.insert(pos) || cell.is_cached() {
            continue;
        }
        stack.push((pos, true));
        stack.extend(
            cell.depends_on()
                .filter(|dep| !visited.contains(dep) && is_stale(dep))
                .map(|dep| (dep, false)),
        );
    }
}
