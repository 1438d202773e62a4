//! What a construction sees while it evaluates its formulas.

use std::collections::BTreeSet;

use crate::errors::{EvalError, GeometryError};
use crate::expr::{Evaluation, Expression};
use crate::symbols::{SymbolOwner, SymbolTable};
use crate::types::Dependency;

/// A failure inside one construction, before it is pinned to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub parameter: Option<&'static str>,
    pub error: EvalError,
}

impl Fault {
    pub fn new(parameter: &'static str, error: impl Into<EvalError>) -> Self {
        Fault {
            parameter: Some(parameter),
            error: error.into(),
        }
    }
}

impl From<GeometryError> for Fault {
    fn from(e: GeometryError) -> Self {
        Fault {
            parameter: None,
            error: e.into(),
        }
    }
}

impl From<EvalError> for Fault {
    fn from(error: EvalError) -> Self {
        Fault {
            parameter: None,
            error,
        }
    }
}

/// Read-only view of the symbol table that records every symbol a node reads.
pub struct Scope<'a> {
    symbols: &'a SymbolTable,
    used: BTreeSet<Dependency>,
}

impl<'a> Scope<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Scope {
            symbols,
            used: BTreeSet::new(),
        }
    }

    /// Evaluate the formula behind `parameter`.
    pub fn evaluate(
        &mut self,
        parameter: &'static str,
        expression: &mut Expression,
    ) -> Result<f64, Fault> {
        let value = match expression.evaluate(self.symbols) {
            Ok(Evaluation::Value(v)) => v,
            Ok(Evaluation::Unresolved(missing)) => {
                let missing = match expression.parsed() {
                    Some(parsed) => missing
                        .iter()
                        .map(|name| parsed.display_name(name).to_string())
                        .collect(),
                    None => missing,
                };
                return Err(Fault::new(
                    parameter,
                    EvalError::UnresolvedExpression { missing },
                ));
            }
            Err(e) => return Err(Fault::new(parameter, e)),
        };

        for name in expression.dependencies().into_iter().flatten() {
            match self.symbols.symbol(name).map(|s| &s.owner) {
                Some(SymbolOwner::Measurement(m)) => {
                    self.used.insert(Dependency::Measurement(m.clone()));
                }
                Some(SymbolOwner::Node(id)) => {
                    self.used.insert(Dependency::Node(*id));
                }
                Some(SymbolOwner::Transient) | None => {}
            }
        }
        Ok(value)
    }

    /// Everything read through this scope.
    pub fn into_used(self) -> BTreeSet<Dependency> {
        self.used
    }
}
