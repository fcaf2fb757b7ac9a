//! Sheet configuration.

use serde::Deserialize;

use gridcalc_engine::engine::EngineLimits;

/// Tunables for a [`Sheet`](crate::Sheet). Every field has a default, so a
/// partial table deserializes.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    /// Rhai operation budget for a single formula evaluation.
    pub max_operations: u64,
    /// Maximum nesting depth of a formula expression.
    pub max_expr_depth: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        let limits = EngineLimits::default();
        SheetConfig {
            max_operations: limits.max_operations,
            max_expr_depth: limits.max_expr_depth,
        }
    }
}

impl SheetConfig {
    pub fn engine_limits(&self) -> EngineLimits {
        EngineLimits {
            max_operations: self.max_operations,
            max_expr_depth: self.max_expr_depth,
        }
    }
}
