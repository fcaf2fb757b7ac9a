//! Error types for the gridcalc command runner

use gridcalc_core::GridcalcError;
use thiserror::Error;

/// Errors that can occur while running a command script
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Sheet {
        line: usize,
        #[source]
        source: GridcalcError,
    },
}

pub type Result<T> = std::result::Result<T, CliError>;
