//! The value namespace formulas are evaluated against
//!
//! Every symbol remembers who published it. A symbol can only be replaced by
//! its own owner, so a value stays fixed for the rest of a pass once another
//! calculation has had a chance to read it.

use std::collections::BTreeMap;
use std::ops::Deref;

use crate::errors::EvalError;
use crate::types::NodeId;

/// Reserved symbol bound to the length of the segment a point is measured against.
pub const CURRENT_LENGTH: &str = "CurrentLength";

/// Who published a symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolOwner {
    /// A measurement, by canonical name.
    Measurement(String),
    Node(NodeId),
    /// A scoped binding such as [`CURRENT_LENGTH`].
    Transient,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub value: f64,
    pub owner: SymbolOwner,
}

/// Symbol table owned by one calculation graph.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.symbols.get(name).map(|s| s.value)
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Publish `name`. Republishing is only allowed for the same owner.
    pub fn publish(
        &mut self,
        name: impl Into<String>,
        value: f64,
        owner: SymbolOwner,
    ) -> Result<(), EvalError> {
        let name = name.into();
        if self.symbols.get(&name).is_some_and(|s| s.owner != owner) {
            return Err(EvalError::DuplicateSymbol { name });
        }
        self.symbols.insert(name, Symbol { value, owner });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    /// Bind `name` until the returned guard is dropped.
    ///
    /// Whatever was bound under `name` before is restored on drop, on every
    /// exit path including an early `?` return.
    pub fn bind_transient(&mut self, name: &'static str, value: f64) -> TransientBinding<'_> {
        let previous = self.symbols.insert(
            name.to_string(),
            Symbol {
                value,
                owner: SymbolOwner::Transient,
            },
        );
        TransientBinding {
            table: self,
            name,
            previous,
        }
    }
}

/// Scoped binding created by [`SymbolTable::bind_transient`].
pub struct TransientBinding<'a> {
    table: &'a mut SymbolTable,
    name: &'static str,
    previous: Option<Symbol>,
}

impl Deref for TransientBinding<'_> {
    type Target = SymbolTable;

    fn deref(&self) -> &SymbolTable {
        self.table
    }
}

impl Drop for TransientBinding<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                self.table.symbols.insert(self.name.to_string(), previous);
            }
            None => {
                self.table.symbols.remove(self.name);
            }
        }
    }
}
