//! gridcalc_engine - Cell dependency graph + Rhai formula integration.

pub mod engine;
