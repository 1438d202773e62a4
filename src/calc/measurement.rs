//! Body measurements
//!
//! Measurements may be defined in terms of one another. They are resolved by
//! sweeping the list until a sweep makes no progress.

use crate::errors::{DraftError, EvalError, FormulaOwner};
use crate::expr::{Evaluation, Expression};
use crate::log::debug;
use crate::parse::{CUSTOM_PREFIX, CUSTOM_SIGIL, canonical_name};
use crate::symbols::{SymbolOwner, SymbolTable};

/// A measurement as supplied by a loader.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementDescriptor {
    pub name: String,
    /// A plain number is a formula too.
    pub formula: String,
    pub custom: bool,
}

impl MeasurementDescriptor {
    /// Custom when `name` starts with `@`.
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        let name = name.into();
        let custom = name.starts_with(CUSTOM_SIGIL);
        MeasurementDescriptor {
            name,
            formula: formula.into(),
            custom,
        }
    }

    pub fn custom(name: impl Into<String>, formula: impl Into<String>) -> Self {
        MeasurementDescriptor {
            custom: true,
            ..MeasurementDescriptor::new(name, formula)
        }
    }

    /// Name as shown to users, with the sigil for custom measurements.
    pub fn display_name(&self) -> String {
        if self.custom && !self.name.starts_with(CUSTOM_SIGIL) {
            format!("{CUSTOM_SIGIL}{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Clone, Debug)]
pub struct Measurement {
    display_name: String,
    canonical_name: String,
    custom: bool,
    expression: Expression,
}

impl Measurement {
    pub(crate) fn new(descriptor: MeasurementDescriptor) -> Result<Self, DraftError> {
        let display_name = descriptor.display_name();
        let mut expression = Expression::new(descriptor.formula);
        expression
            .parse()
            .map_err(|source| DraftError::InvalidFormula {
                owner: FormulaOwner::Measurement(display_name.clone()),
                source,
            })?;
        Ok(Measurement {
            canonical_name: canonical_name(&display_name),
            display_name,
            custom: descriptor.custom,
            expression,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Name published in the symbol table.
    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    pub fn formula(&self) -> &str {
        self.expression.formula()
    }

    /// Value from the last pass.
    pub fn value(&self) -> Option<f64> {
        self.expression.value()
    }

    pub(crate) fn invalidate(&mut self) {
        self.expression.invalidate();
    }
}

/// Evaluate every measurement and publish it under its canonical name.
pub(crate) fn resolve(
    measurements: &mut [Measurement],
    symbols: &mut SymbolTable,
) -> Result<(), DraftError> {
    loop {
        let mut progress = false;
        let mut stuck = None;

        for m in measurements.iter_mut().filter(|m| m.value().is_none()) {
            let failed = |source: EvalError| DraftError::Measurement {
                name: m.display_name.clone(),
                source,
            };
            match m.expression.evaluate(symbols) {
                Ok(Evaluation::Value(value)) => {
                    symbols
                        .publish(
                            m.canonical_name.clone(),
                            value,
                            SymbolOwner::Measurement(m.canonical_name.clone()),
                        )
                        .map_err(failed)?;
                    debug!(measurement = %m.display_name, value, "resolved measurement");
                    progress = true;
                }
                Ok(Evaluation::Unresolved(missing)) => {
                    stuck.get_or_insert((m.display_name.clone(), missing));
                }
                Err(e) => return Err(failed(e)),
            }
        }

        match stuck {
            None => return Ok(()),
            Some(_) if progress => continue,
            Some((name, missing)) => {
                return Err(DraftError::Measurement {
                    name,
                    source: EvalError::UnresolvedExpression {
                        missing: missing.iter().map(|n| display_form(n)).collect(),
                    },
                });
            }
        }
    }
}

/// Inverse of [`canonical_name`].
fn display_form(canonical: &str) -> String {
    match canonical.strip_prefix(CUSTOM_PREFIX) {
        Some(rest) => format!("{CUSTOM_SIGIL}{rest}"),
        None => canonical.to_string(),
    }
}
