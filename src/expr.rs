//! Formula evaluation
//!
//! A formula goes through three states: unparsed, parsed (AST built and the
//! referenced symbols known) and evaluated (value cached). A reference to a
//! symbol that has not been published yet is not an error; it yields
//! [`Evaluation::Unresolved`] so the caller can try again later.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::*;
use crate::errors::{ArithmeticError, EvalError, SyntaxError};
use crate::parse::parse_formula;
use crate::symbols::SymbolTable;

/// A formula after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpression {
    formula: String,
    ast: Expr,
    symbols: BTreeSet<String>,
    display_names: BTreeMap<String, String>,
}

impl ParsedExpression {
    /// The formula as written.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Name as written in the formula for a canonical symbol name.
    pub fn display_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.display_names
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }
}

/// Outcome of evaluating a formula against a namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value(f64),
    /// Canonical names of the symbols that were missing, sorted.
    Unresolved(Vec<String>),
}

impl Evaluation {
    pub fn value(&self) -> Option<f64> {
        match self {
            Evaluation::Value(v) => Some(*v),
            Evaluation::Unresolved(_) => None,
        }
    }
}

pub fn parse(formula: &str) -> Result<ParsedExpression, SyntaxError> {
    let (ast, rewrite) = parse_formula(formula)?;
    let mut symbols = BTreeSet::new();
    ast.collect_symbols(&mut symbols);
    Ok(ParsedExpression {
        formula: formula.to_string(),
        ast,
        symbols,
        display_names: rewrite.display_names,
    })
}

/// Distinct canonical symbol names referenced by the formula.
pub fn dependencies(parsed: &ParsedExpression) -> &BTreeSet<String> {
    &parsed.symbols
}

pub fn evaluate(
    parsed: &ParsedExpression,
    namespace: &SymbolTable,
) -> Result<Evaluation, ArithmeticError> {
    let missing: Vec<String> = parsed
        .symbols
        .iter()
        .filter(|name| !namespace.contains(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Ok(Evaluation::Unresolved(missing));
    }
    eval_expr(&parsed.ast, namespace).map(Evaluation::Value)
}

fn eval_expr(expr: &Expr, ns: &SymbolTable) -> Result<f64, ArithmeticError> {
    match expr {
        Expr::Literal(text) => {
            let value: f64 = text.parse().map_err(|_| ArithmeticError::InvalidLiteral {
                literal: text.clone(),
            })?;
            if !value.is_finite() {
                return Err(ArithmeticError::InvalidLiteral {
                    literal: text.clone(),
                });
            }
            Ok(value)
        }
        // Presence was checked up front; a vanished symbol reads as non-finite.
        Expr::Symbol(name) => ns.get(name).ok_or(ArithmeticError::NonFinite),
        Expr::Unary(op, e) => {
            let v = eval_expr(e, ns)?;
            Ok(match op {
                UnaryOp::Neg => -v,
                UnaryOp::Pos => v,
            })
        }
        Expr::Binary(lhs, op, rhs) => {
            let a = eval_expr(lhs, ns)?;
            let b = eval_expr(rhs, ns)?;
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => {
                    if b == 0.0 {
                        return Err(ArithmeticError::DivisionByZero);
                    }
                    a / b
                }
            };
            finite(result)
        }
        Expr::Call(func, args) => {
            let args = args
                .iter()
                .map(|a| eval_expr(a, ns))
                .collect::<Result<Vec<f64>, _>>()?;
            let arg = |i: usize| args.get(i).copied().ok_or(ArithmeticError::NonFinite);
            let x = arg(0)?;
            let domain = |argument: f64| ArithmeticError::Domain {
                function: func.name(),
                argument,
            };
            let result = match func {
                Function::Abs => x.abs(),
                Function::Sqrt => {
                    if x < 0.0 {
                        return Err(domain(x));
                    }
                    x.sqrt()
                }
                Function::Min => x.min(arg(1)?),
                Function::Max => x.max(arg(1)?),
                Function::Sin => x.to_radians().sin(),
                Function::Cos => x.to_radians().cos(),
                Function::Tan => x.to_radians().tan(),
                Function::Asin => {
                    if !(-1.0..=1.0).contains(&x) {
                        return Err(domain(x));
                    }
                    x.asin().to_degrees()
                }
                Function::Acos => {
                    if !(-1.0..=1.0).contains(&x) {
                        return Err(domain(x));
                    }
                    x.acos().to_degrees()
                }
                Function::Atan => x.atan().to_degrees(),
            };
            finite(result)
        }
    }
}

/// Catches overflow to infinity.
fn finite(v: f64) -> Result<f64, ArithmeticError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ArithmeticError::NonFinite)
    }
}

/// Where an [`Expression`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionState {
    Unparsed,
    Parsed,
    Evaluated,
}

/// A formula with a cached parse and a memoized value.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    formula: String,
    parsed: Option<ParsedExpression>,
    value: Option<f64>,
}

impl Expression {
    pub fn new(formula: impl Into<String>) -> Self {
        Expression {
            formula: formula.into(),
            parsed: None,
            value: None,
        }
    }

    /// Formula for a plain number, parsed up front.
    ///
    /// A non-finite value still becomes a literal, so evaluating it fails
    /// with [`ArithmeticError::InvalidLiteral`].
    pub fn constant(value: f64) -> Self {
        let formula = value.to_string();
        let parsed = ParsedExpression {
            formula: formula.clone(),
            ast: Expr::Literal(formula.clone()),
            symbols: BTreeSet::new(),
            display_names: BTreeMap::new(),
        };
        Expression {
            formula,
            parsed: Some(parsed),
            value: None,
        }
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn state(&self) -> ExpressionState {
        match (&self.parsed, self.value) {
            (None, _) => ExpressionState::Unparsed,
            (Some(_), None) => ExpressionState::Parsed,
            (Some(_), Some(_)) => ExpressionState::Evaluated,
        }
    }

    /// Parse once; later calls return the cached tree.
    pub fn parse(&mut self) -> Result<&ParsedExpression, SyntaxError> {
        let parsed = match self.parsed.take() {
            Some(parsed) => parsed,
            None => parse(&self.formula)?,
        };
        Ok(self.parsed.insert(parsed))
    }

    pub fn parsed(&self) -> Option<&ParsedExpression> {
        self.parsed.as_ref()
    }

    /// Referenced symbols, once parsed.
    pub fn dependencies(&self) -> Option<&BTreeSet<String>> {
        self.parsed.as_ref().map(dependencies)
    }

    /// Evaluate, reusing the memoized value until [`Expression::invalidate`].
    ///
    /// An unresolved outcome is not cached.
    pub fn evaluate(&mut self, namespace: &SymbolTable) -> Result<Evaluation, EvalError> {
        if let Some(v) = self.value {
            return Ok(Evaluation::Value(v));
        }
        let outcome = evaluate(self.parse()?, namespace)?;
        if let Evaluation::Value(v) = outcome {
            self.value = Some(v);
        }
        Ok(outcome)
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Drop the cached value, keeping the parse.
    pub fn invalidate(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolOwner;

    fn table(entries: &[(&str, f64)]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, value) in entries {
            table
                .publish(*name, *value, SymbolOwner::Measurement(name.to_string()))
                .unwrap();
        }
        table
    }

    fn eval(formula: &str, ns: &SymbolTable) -> Result<Evaluation, ArithmeticError> {
        evaluate(&parse(formula).unwrap(), ns)
    }

    fn value(formula: &str) -> f64 {
        match eval(formula, &SymbolTable::new()) {
            Ok(Evaluation::Value(v)) => v,
            other => panic!("{formula:?} did not evaluate: {other:?}"),
        }
    }

    // ==================== Arithmetic tests ====================

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(value("1 + 2 * 3"), 7.0);
        assert_eq!(value("(1 + 2) * 3"), 9.0);
        assert_eq!(value("10 - 4 - 3"), 3.0);
        assert_eq!(value("-2 * -3"), 6.0);
        assert_eq!(value("8 / 4 / 2"), 1.0);
    }

    #[test]
    fn functions_use_degrees() {
        assert!((value("sin(30)") - 0.5).abs() < 1e-12);
        assert!((value("cos(60)") - 0.5).abs() < 1e-12);
        assert!((value("tan(45)") - 1.0).abs() < 1e-12);
        assert!((value("asin(0.5)") - 30.0).abs() < 1e-9);
        assert!((value("acos(0)") - 90.0).abs() < 1e-9);
        assert!((value("atan(1)") - 45.0).abs() < 1e-9);
        assert_eq!(value("max(3, min(4, 5))"), 4.0);
        assert_eq!(value("abs(-2) + sqrt(16)"), 6.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let ns = table(&[("zero", 0.0)]);
        assert_eq!(eval("1 / zero", &ns), Err(ArithmeticError::DivisionByZero));
        assert_eq!(eval("1 / (2 - 2)", &ns), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn domain_errors_name_the_function() {
        let ns = SymbolTable::new();
        assert_eq!(
            eval("sqrt(-4)", &ns),
            Err(ArithmeticError::Domain {
                function: "sqrt",
                argument: -4.0
            })
        );
        assert!(matches!(
            eval("acos(2)", &ns),
            Err(ArithmeticError::Domain {
                function: "acos",
                ..
            })
        ));
    }

    #[test]
    fn overflow_is_non_finite() {
        let ns = SymbolTable::new();
        assert_eq!(eval("1e308 * 10", &ns), Err(ArithmeticError::NonFinite));
        assert_eq!(
            eval("1e999", &ns),
            Err(ArithmeticError::InvalidLiteral {
                literal: "1e999".into()
            })
        );
    }

    // ==================== Symbol tests ====================

    #[test]
    fn symbols_resolve_from_namespace() {
        let ns = table(&[("waist", 70.0), ("hip", 98.0)]);
        assert_eq!(eval("(waist + hip) / 4", &ns), Ok(Evaluation::Value(42.0)));
    }

    #[test]
    fn missing_symbols_are_unresolved_and_sorted() {
        let ns = table(&[("waist", 70.0)]);
        assert_eq!(
            eval("waist + zeta + alpha + zeta", &ns),
            Ok(Evaluation::Unresolved(vec!["alpha".into(), "zeta".into()]))
        );
    }

    #[test]
    fn unresolved_wins_over_arithmetic_errors() {
        assert_eq!(
            eval("1 / 0 + later", &SymbolTable::new()),
            Ok(Evaluation::Unresolved(vec!["later".into()]))
        );
    }

    #[test]
    fn custom_names_resolve_under_canonical_names() {
        let parsed = parse("@front_rise * 2").unwrap();
        assert_eq!(
            dependencies(&parsed).iter().collect::<Vec<_>>(),
            ["__custom__front_rise"]
        );
        assert_eq!(parsed.display_name("__custom__front_rise"), "@front_rise");
        let ns = table(&[("__custom__front_rise", 26.0)]);
        assert_eq!(evaluate(&parsed, &ns), Ok(Evaluation::Value(52.0)));
    }

    // ==================== Expression lifecycle tests ====================

    #[test]
    fn expression_states() {
        let mut e = Expression::new("a + 1");
        assert_eq!(e.state(), ExpressionState::Unparsed);
        assert!(e.dependencies().is_none());

        e.parse().unwrap();
        assert_eq!(e.state(), ExpressionState::Parsed);

        let empty = SymbolTable::new();
        assert_eq!(
            e.evaluate(&empty).unwrap(),
            Evaluation::Unresolved(vec!["a".into()])
        );
        assert_eq!(e.state(), ExpressionState::Parsed);

        let ns = table(&[("a", 2.0)]);
        assert_eq!(e.evaluate(&ns).unwrap(), Evaluation::Value(3.0));
        assert_eq!(e.state(), ExpressionState::Evaluated);
    }

    #[test]
    fn evaluation_is_memoized_until_invalidated() {
        let mut e = Expression::new("a * 2");
        e.evaluate(&table(&[("a", 2.0)])).unwrap();

        let changed = table(&[("a", 10.0)]);
        assert_eq!(e.evaluate(&changed).unwrap(), Evaluation::Value(4.0));

        e.invalidate();
        assert_eq!(e.state(), ExpressionState::Parsed);
        assert_eq!(e.evaluate(&changed).unwrap(), Evaluation::Value(20.0));
    }

    #[test]
    fn lazy_parse_reports_syntax_errors() {
        let mut e = Expression::new("1 +");
        assert!(matches!(
            e.evaluate(&SymbolTable::new()),
            Err(EvalError::Syntax(_))
        ));
        assert_eq!(e.state(), ExpressionState::Unparsed);
    }

    #[test]
    fn constants_round_trip() {
        let mut e = Expression::constant(12.5);
        assert_eq!(e.formula(), "12.5");
        assert_eq!(e.evaluate(&SymbolTable::new()).unwrap().value(), Some(12.5));
        assert_eq!(Expression::constant(-3.0).evaluate(&SymbolTable::new()).unwrap().value(), Some(-3.0));
    }

    #[test]
    fn non_finite_constants_are_invalid_literals() {
        for (value, literal) in [(f64::NAN, "NaN"), (f64::INFINITY, "inf"), (f64::NEG_INFINITY, "-inf")] {
            let mut e = Expression::constant(value);
            assert_eq!(
                e.evaluate(&SymbolTable::new()),
                Err(EvalError::Arithmetic(ArithmeticError::InvalidLiteral {
                    literal: literal.into()
                }))
            );
        }
    }
}
