//! Spreadsheet engine API.
//!
//! This module provides the computation core for a sheet:
//!
//! - [`Cell`], [`CellContent`], [`CellValue`], [`Grid`] - Data structures for cell storage
//! - [`Position`], [`Size`] - Cell addresses (A1 notation ↔ row/col indices)
//! - [`detect_cycle`] - Circular dependency detection
//! - [`commit_content`], [`invalidate_dependents`] - Edge rewiring and cache invalidation
//! - [`FormulaEngine`], [`Formula`] - Rhai-backed formula compilation and evaluation
//! - [`format_number`] - Format values for display

mod cell;
mod cycle;
mod deps;
mod eval;
mod format;
mod graph;
mod position;
mod preprocess;

pub use cell::{CacheState, Cell, CellContent, CellValue, Grid};
pub use cycle::detect_cycle;
pub use deps::{Reference, extract_references, referenced_positions};
pub use eval::{
    CellLookup, ESCAPE_SIGN, EngineLimits, FORMULA_SIGN, Formula, FormulaEngine, FormulaError,
    SyntaxError,
};
pub use format::format_number;
pub use graph::{CommitReport, commit_content, invalidate_dependents};
pub use position::{MAX_COLS, MAX_ROWS, Position, Size};
pub use preprocess::promote_integer_literals;
