//! Error types for Gridcalc core.

use thiserror::Error;

use gridcalc_engine::engine::{Position, SyntaxError};

/// Structural failures of sheet operations.
///
/// Formula evaluation failures are not errors; they are
/// [`CellValue::Error`](gridcalc_engine::engine::CellValue::Error) values.
#[derive(Error, Debug)]
pub enum GridcalcError {
    #[error("Invalid position ({}, {})", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("Circular dependency detected at {cell}: {}", render_path(.path))]
    CircularDependency { cell: Position, path: Vec<Position> },

    #[error("Formula syntax error: {0}")]
    FormulaSyntax(#[from] SyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn render_path(path: &[Position]) -> String {
    path.iter()
        .map(|pos| pos.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, GridcalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_path() {
        let err = GridcalcError::CircularDependency {
            cell: Position::new(0, 1),
            path: vec![Position::new(0, 0), Position::new(0, 1)],
        };
        assert_eq!(err.to_string(), "Circular dependency detected at B1: A1 -> B1");
    }

    #[test]
    fn test_invalid_position_message_uses_coordinates() {
        let err = GridcalcError::InvalidPosition(Position::new(-1, 3));
        assert_eq!(err.to_string(), "Invalid position (-1, 3)");
    }
}
