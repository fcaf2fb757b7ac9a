//! Formula compilation and evaluation on top of Rhai.
//!
//! A [`FormulaEngine`] owns the configured Rhai engine and compiles formula
//! expressions into [`Formula`] values. A formula knows the cells it reads;
//! at evaluation time each referenced cell is resolved through a
//! [`CellLookup`], coerced to a number and bound as a constant in the Rhai
//! scope before the compiled expression runs.

use std::fmt;
use std::sync::Arc;

use rhai::{AST, Dynamic, Engine, EvalAltResult, Scope};
use thiserror::Error;

use super::cell::CellValue;
use super::deps::{Reference, extract_references, referenced_positions};
use super::position::Position;
use super::preprocess::promote_integer_literals;

/// Leading character that marks cell input as a formula.
pub const FORMULA_SIGN: char = '=';
/// Leading character that forces cell input to be treated as text.
pub const ESCAPE_SIGN: char = '\'';

/// Value-level failure of a formula. These are cell values, not Rust errors.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum FormulaError {
    /// A reference to a position outside the sheet.
    Ref,
    /// An operand or result that is not a number.
    Value,
    /// Division by zero, overflow or any other non-finite result.
    Arithmetic,
}

impl FormulaError {
    pub fn code(&self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Arithmetic => "#ARITHM!",
        }
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A formula expression that Rhai could not compile.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot compile `{expression}`: {message}")]
pub struct SyntaxError {
    pub expression: String,
    pub message: String,
}

/// Resolves positions to computed values during formula evaluation.
pub trait CellLookup {
    /// The value at `pos`, or `None` when no cell exists there.
    fn value_at(&self, pos: Position) -> Option<CellValue>;
}

/// Resource limits applied to every formula evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_operations: u64,
    pub max_expr_depth: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        EngineLimits {
            max_operations: 100_000,
            max_expr_depth: 64,
        }
    }
}

/// Compiles formula expressions. Cheap to clone; clones share one Rhai engine.
#[derive(Clone)]
pub struct FormulaEngine {
    engine: Arc<Engine>,
}

impl FormulaEngine {
    /// Create an engine with default limits.
    pub fn new() -> Self {
        Self::with_limits(EngineLimits::default())
    }

    pub fn with_limits(limits: EngineLimits) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(limits.max_operations);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        // Formulas must not write to the terminal.
        engine.on_print(|_| {});
        FormulaEngine {
            engine: Arc::new(engine),
        }
    }

    /// Compile a formula expression (the text after `=`).
    pub fn compile(&self, expression: &str) -> Result<Formula, SyntaxError> {
        let expression = expression.trim();
        let script = promote_integer_literals(expression);
        let ast = self
            .engine
            .compile_expression(&script)
            .map_err(|err| SyntaxError {
                expression: expression.to_string(),
                message: err.to_string(),
            })?;

        let references = extract_references(expression);
        let cells = referenced_positions(&references);

        Ok(Formula {
            engine: Arc::clone(&self.engine),
            ast,
            expression: expression.to_string(),
            references,
            cells,
        })
    }
}

impl Default for FormulaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormulaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaEngine").finish_non_exhaustive()
    }
}

/// A compiled formula.
#[derive(Clone)]
pub struct Formula {
    engine: Arc<Engine>,
    ast: AST,
    expression: String,
    references: Vec<Reference>,
    cells: Vec<Position>,
}

impl Formula {
    /// The expression text, without the leading `=`.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Positions this formula reads, deduplicated, in order of first occurrence.
    pub fn referenced_cells(&self) -> &[Position] {
        &self.cells
    }

    /// Evaluate against `lookup`.
    ///
    /// Operands are resolved in order of first occurrence and the first one
    /// that fails decides the error.
    pub fn evaluate(&self, lookup: &dyn CellLookup) -> Result<f64, FormulaError> {
        let mut scope = Scope::new();
        for reference in &self.references {
            let pos = reference.position.ok_or(FormulaError::Ref)?;
            let operand = operand_value(lookup.value_at(pos))?;
            scope.push_constant(reference.name.as_str(), operand);
        }

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map_err(|err| classify_runtime_error(&err))?;
        number_from_dynamic(result)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("expression", &self.expression)
            .field("cells", &self.cells)
            .finish_non_exhaustive()
    }
}

/// Coerce a referenced cell's value to a formula operand.
///
/// Missing cells and empty text read as zero; text must parse as a number
/// in full; errors propagate unchanged.
fn operand_value(value: Option<CellValue>) -> Result<f64, FormulaError> {
    match value {
        None => Ok(0.0),
        Some(CellValue::Number(n)) => Ok(n),
        Some(CellValue::Text(text)) if text.is_empty() => Ok(0.0),
        Some(CellValue::Text(text)) => match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(FormulaError::Value),
        },
        Some(CellValue::Error(err)) => Err(err),
    }
}

fn classify_runtime_error(err: &EvalAltResult) -> FormulaError {
    match err {
        EvalAltResult::ErrorArithmetic(..) => FormulaError::Arithmetic,
        EvalAltResult::ErrorVariableNotFound(..) => FormulaError::Ref,
        _ => FormulaError::Value,
    }
}

fn number_from_dynamic(value: Dynamic) -> Result<f64, FormulaError> {
    let n = if let Ok(n) = value.as_float() {
        n
    } else if let Ok(n) = value.as_int() {
        n as f64
    } else if let Ok(b) = value.as_bool() {
        if b { 1.0 } else { 0.0 }
    } else {
        return Err(FormulaError::Value);
    };

    if n.is_finite() {
        Ok(n)
    } else {
        Err(FormulaError::Arithmetic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Values(HashMap<Position, CellValue>);

    impl Values {
        fn with(mut self, name: &str, value: CellValue) -> Self {
            self.0.insert(Position::from_str(name).unwrap(), value);
            self
        }
    }

    impl CellLookup for Values {
        fn value_at(&self, pos: Position) -> Option<CellValue> {
            self.0.get(&pos).cloned()
        }
    }

    fn eval(expression: &str, values: &Values) -> Result<f64, FormulaError> {
        FormulaEngine::new().compile(expression).unwrap().evaluate(values)
    }

    #[test]
    fn test_arithmetic_is_floating_point() {
        let values = Values::default();
        assert_eq!(eval("5 / 2", &values), Ok(2.5));
        assert_eq!(eval("1 + 2 * 3", &values), Ok(7.0));
        assert_eq!(eval("-(4 - 6)", &values), Ok(2.0));
    }

    #[test]
    fn test_scientific_notation() {
        let values = Values::default();
        assert_eq!(eval("1.5e-3", &values), Ok(0.0015));
        assert_eq!(eval("2e+3 / 4", &values), Ok(500.0));
        assert_eq!(eval("2e3", &values), Ok(2000.0));
    }

    #[test]
    fn test_division_by_zero_is_arithmetic_error() {
        let values = Values::default();
        assert_eq!(eval("1/0", &values), Err(FormulaError::Arithmetic));
        assert_eq!(eval("0/0", &values), Err(FormulaError::Arithmetic));
    }

    #[test]
    fn test_references_are_resolved() {
        let values = Values::default()
            .with("A1", CellValue::Number(5.0))
            .with("B2", CellValue::Text("2.5".to_string()));
        assert_eq!(eval("A1 + 1", &values), Ok(6.0));
        assert_eq!(eval("A1 * B2", &values), Ok(12.5));
    }

    #[test]
    fn test_missing_and_empty_cells_read_as_zero() {
        let values = Values::default().with("A1", CellValue::Text(String::new()));
        assert_eq!(eval("A1 + C3 + 1", &values), Ok(1.0));
    }

    #[test]
    fn test_non_numeric_text_is_value_error() {
        let values = Values::default().with("A1", CellValue::Text("hello".to_string()));
        assert_eq!(eval("A1 + 1", &values), Err(FormulaError::Value));
    }

    #[test]
    fn test_errors_propagate_through_references() {
        let values = Values::default()
            .with("A1", CellValue::Error(FormulaError::Arithmetic))
            .with("B1", CellValue::Text("x".to_string()));
        assert_eq!(eval("A1 + 1", &values), Err(FormulaError::Arithmetic));
        assert_eq!(eval("B1 + A1", &values), Err(FormulaError::Value));
    }

    #[test]
    fn test_out_of_range_reference_is_ref_error() {
        assert_eq!(eval("ZZZZ1 + 1", &Values::default()), Err(FormulaError::Ref));
        assert!(
            FormulaEngine::new()
                .compile("ZZZZ1 + 1")
                .unwrap()
                .referenced_cells()
                .is_empty()
        );
    }

    #[test]
    fn test_unbound_variable_is_ref_error() {
        assert_eq!(eval("a1 + 1", &Values::default()), Err(FormulaError::Ref));
    }

    #[test]
    fn test_non_numeric_result_is_value_error() {
        assert_eq!(eval(r#""text""#, &Values::default()), Err(FormulaError::Value));
        assert_eq!(eval("2 > 1", &Values::default()), Ok(1.0));
    }

    #[test]
    fn test_syntax_errors_are_rejected_at_compile_time() {
        let engine = FormulaEngine::new();
        assert!(engine.compile("1 +").is_err());
        assert!(engine.compile("(1").is_err());
        assert!(engine.compile("let x = 1; x").is_err());
        let err = engine.compile("1 +").unwrap_err();
        assert_eq!(err.expression, "1 +");
    }

    #[test]
    fn test_expression_and_references() {
        let formula = FormulaEngine::new().compile("  B1 + A1 * B1 ").unwrap();
        assert_eq!(formula.expression(), "B1 + A1 * B1");
        assert_eq!(
            formula.referenced_cells(),
            &[Position::new(0, 1), Position::new(0, 0)]
        );
    }

    #[test]
    fn test_operation_limit_is_value_error() {
        let engine = FormulaEngine::with_limits(EngineLimits {
            max_operations: 10,
            max_expr_depth: 64,
        });
        let expression = vec!["A1"; 40].join(" + ");
        let formula = engine.compile(&expression).unwrap();
        let values = Values::default().with("A1", CellValue::Number(1.0));
        assert_eq!(formula.evaluate(&values), Err(FormulaError::Value));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FormulaError::Ref.to_string(), "#REF!");
        assert_eq!(FormulaError::Value.to_string(), "#VALUE!");
        assert_eq!(FormulaError::Arithmetic.to_string(), "#ARITHM!");
    }
}
