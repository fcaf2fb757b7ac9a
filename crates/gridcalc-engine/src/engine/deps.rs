//! Reference extraction from formula strings.
//!
//! Scans formula text for A1-style cell references. The result feeds both
//! the dependency graph (which positions a formula reads) and evaluation
//! (which names must be bound before the formula runs).
//!
//! Handles:
//! - Simple cell references: `A1`, `AB12`
//! - Ignores references inside string literals
//! - Ignores uppercase function calls that look like references (`LOG10(x)`)
//! - Keeps out-of-range tokens (`ZZZZ1`) so evaluation can report `#REF!`

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::position::Position;

/// A cell reference token found in a formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// The token exactly as written, used as the variable name at evaluation.
    pub name: String,
    /// The referenced position, or `None` if the token lies outside the sheet.
    pub position: Option<Position>,
}

/// Extract all distinct reference tokens, in order of first occurrence.
pub fn extract_references(expression: &str) -> Vec<Reference> {
    let script = strip_string_literals(expression);
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for caps in cell_ref_re().captures_iter(&script) {
        if caps.get(2).is_some() {
            continue;
        }
        let name = &caps[1];
        if seen.insert(name.to_string()) {
            refs.push(Reference {
                name: name.to_string(),
                position: Position::from_str(name),
            });
        }
    }

    refs
}

/// Distinct valid positions among `refs`, keeping first-occurrence order.
pub fn referenced_positions(refs: &[Reference]) -> Vec<Position> {
    let mut seen = HashSet::new();
    refs.iter()
        .filter_map(|r| r.position)
        .filter(|pos| seen.insert(*pos))
        .collect()
}

fn cell_ref_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]+[0-9]+)\b(\s*\()?")
            .expect("dependency cell reference regex must compile")
    })
}

/// Blank out the contents of string literals, keeping byte offsets intact.
pub(crate) fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in script.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.push(' ');
                } else if ch == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                } else {
                    out.push(' ');
                }
            }
            None => {
                if ch == '"' || ch == '`' {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }

    out
}
