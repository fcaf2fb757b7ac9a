//! Dependency edge maintenance and cache invalidation.
//!
//! Every cell stores both directions of its edges: `depends_on` (cells it
//! reads) and `dependents` (cells that read it). For any two cells A and B,
//! `B ∈ A.depends_on` exactly when `A ∈ B.dependents`. The functions here are
//! the only code that changes edges, and they always change both sides.

use std::collections::HashSet;

use tracing::trace;

use super::cell::{CellContent, Grid};
use super::position::Position;

/// What a [`commit_content`] call changed besides the cell itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Positions that had no cell and were created empty because the new
    /// content references them.
    pub created: Vec<Position>,
    /// Number of cells whose cache was cleared, including `pos` itself.
    pub invalidated: usize,
}

/// Store `content` at `pos`, rewire its edges and invalidate dependents.
///
/// Creates the cell at `pos` if needed. The caller is responsible for
/// rejecting content whose references would close a cycle (see
/// [`detect_cycle`](super::detect_cycle)); this function does not check.
pub fn commit_content(grid: &mut Grid, pos: Position, content: CellContent) -> CommitReport {
    let targets = content.referenced_cells().to_vec();
    grid.entry(pos).or_default().content = content;
    let created = replace_dependencies(grid, pos, &targets);
    let invalidated = invalidate_dependents(grid, pos);
    CommitReport {
        created,
        invalidated,
    }
}

/// Replace the outgoing edges of `pos` with `targets`, keeping reciprocal
/// `dependents` entries in step. Missing targets are created empty.
fn replace_dependencies(grid: &mut Grid, pos: Position, targets: &[Position]) -> Vec<Position> {
    let new_deps: HashSet<Position> = targets.iter().copied().collect();
    let old_deps = match grid.get_mut(&pos) {
        Some(cell) => std::mem::take(&mut cell.depends_on),
        None => HashSet::new(),
    };

    for stale in old_deps.difference(&new_deps) {
        if let Some(target) = grid.get_mut(stale) {
            target.dependents.remove(&pos);
        }
    }

    let mut created = Vec::new();
    for &target in targets {
        let cell = grid.entry(target).or_insert_with(|| {
            created.push(target);
            Default::default()
        });
        cell.dependents.insert(pos);
    }

    if let Some(cell) = grid.get_mut(&pos) {
        cell.depends_on = new_deps;
    }
    created
}

/// Clear the cache of `start` and of every cell that transitively reads it.
///
/// Cells with no dependency path from `start` keep their cache. Returns the
/// number of cells visited.
pub fn invalidate_dependents(grid: &mut Grid, start: Position) -> usize {
    let mut visited: HashSet<Position> = HashSet::new();
    let mut stack = vec![start];

    while let Some(pos) = stack.pop() {
        if !visited.insert(pos) {
            continue;
        }
        let Some(cell) = grid.get_mut(&pos) else {
            continue;
        };
        cell.reset_cache();
        stack.extend(cell.dependents.iter().copied().filter(|p| !visited.contains(p)));
    }

    trace!(cell = %start, invalidated = visited.len(), "invalidated dependent caches");
    visited.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellValue, FormulaEngine};

    fn pos(name: &str) -> Position {
        Position::from_str(name).unwrap()
    }

    fn set(grid: &mut Grid, name: &str, input: &str) -> CommitReport {
        let content = CellContent::from_input(input, &FormulaEngine::new()).unwrap();
        commit_content(grid, pos(name), content)
    }

    fn dependents(grid: &Grid, name: &str) -> Vec<Position> {
        let mut deps: Vec<_> = grid[&pos(name)].dependents().collect();
        deps.sort();
        deps
    }

    #[test]
    fn test_commit_creates_referenced_cells() {
        let mut grid = Grid::new();
        let report = set(&mut grid, "C1", "=A1 + B1");
        assert_eq!(report.created, vec![pos("A1"), pos("B1")]);
        assert!(grid[&pos("A1")].is_empty());
        assert_eq!(dependents(&grid, "A1"), vec![pos("C1")]);
        assert_eq!(dependents(&grid, "B1"), vec![pos("C1")]);
    }

    #[test]
    fn test_rewiring_drops_stale_reverse_edges() {
        let mut grid = Grid::new();
        set(&mut grid, "C1", "=A1 + B1");
        let report = set(&mut grid, "C1", "=B1 + D1");
        assert_eq!(report.created, vec![pos("D1")]);
        assert!(!grid[&pos("A1")].is_referenced());
        assert_eq!(dependents(&grid, "B1"), vec![pos("C1")]);
        assert_eq!(dependents(&grid, "D1"), vec![pos("C1")]);
    }

    #[test]
    fn test_text_content_clears_edges() {
        let mut grid = Grid::new();
        set(&mut grid, "B1", "=A1");
        set(&mut grid, "B1", "plain");
        assert_eq!(grid[&pos("B1")].depends_on().count(), 0);
        assert!(!grid[&pos("A1")].is_referenced());
    }

    #[test]
    fn test_invalidation_follows_dependents_only() {
        let mut grid = Grid::new();
        set(&mut grid, "A1", "1");
        set(&mut grid, "B1", "=A1 + 1");
        set(&mut grid, "C1", "=B1 + 1");
        set(&mut grid, "D1", "7");
        set(&mut grid, "E1", "=D1");

        for name in ["A1", "B1", "C1", "D1", "E1"] {
            grid[&pos(name)].value(&grid);
        }

        assert_eq!(invalidate_dependents(&mut grid, pos("A1")), 3);
        assert!(!grid[&pos("A1")].is_cached());
        assert!(!grid[&pos("B1")].is_cached());
        assert!(!grid[&pos("C1")].is_cached());
        assert!(grid[&pos("D1")].is_cached());
        assert!(grid[&pos("E1")].is_cached());
    }

    #[test]
    fn test_commit_invalidates_downstream_values() {
        let mut grid = Grid::new();
        set(&mut grid, "A1", "2");
        set(&mut grid, "B1", "=A1 * 10");
        assert_eq!(grid[&pos("B1")].value(&grid), CellValue::Number(20.0));

        let report = set(&mut grid, "A1", "3");
        assert_eq!(report.invalidated, 2);
        assert_eq!(grid[&pos("B1")].value(&grid), CellValue::Number(30.0));
    }
}
