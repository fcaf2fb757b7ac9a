//! Circular dependency detection for formula cells.
//!
//! When a formula is entered, we must verify it doesn't create a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1) before any
//! edge is committed. The grid is acyclic between mutations, so giving
//! `start` new edges to `targets` closes a cycle exactly when one of the
//! targets can already reach `start` along existing `depends_on` edges.

use std::collections::{HashMap, HashSet};

use super::{Grid, Position};

/// Check whether `start` may read from `targets`.
///
/// Returns `Some(path)` if the edges would close a cycle, where `path` runs
/// from the offending target along existing edges back to `start`. Targets
/// with no cell in the grid have no edges and cannot be part of a cycle.
pub fn detect_cycle(grid: &Grid, start: Position, targets: &[Position]) -> Option<Vec<Position>> {
    let mut visited: HashSet<Position> = HashSet::new();
    let mut parent: HashMap<Position, Position> = HashMap::new();

    for &target in targets {
        if target == start {
            return Some(vec![start]);
        }
        if !grid.contains_key(&target) || !visited.insert(target) {
            continue;
        }

        let mut stack = vec![target];
        while let Some(current) = stack.pop() {
            let Some(cell) = grid.get(&current) else {
                continue;
            };
            for next in cell.depends_on() {
                if next == start {
                    return Some(trace_path(&parent, current, start));
                }
                if visited.insert(next) {
                    parent.insert(next, current);
                    stack.push(next);
                }
            }
        }
    }

    None
}

fn trace_path(parent: &HashMap<Position, Position>, last: Position, start: Position) -> Vec<Position> {
    let mut path = vec![start, last];
    let mut node = last;
    while let Some(&prev) = parent.get(&node) {
        path.push(prev);
        node = prev;
    }
    path.reverse();
    path
}
