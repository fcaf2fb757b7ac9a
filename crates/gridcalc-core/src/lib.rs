//! gridcalc-core - UI-agnostic sheet model.

pub mod config;
pub mod error;
pub mod print;
pub mod sheet;

pub use config::SheetConfig;
pub use error::{GridcalcError, Result};
pub use sheet::{CellView, CellViewMut, Sheet};

pub use gridcalc_engine::engine::{CellValue, FormulaError, Position, Size};
