use std::collections::HashMap;

use crate::error::RuntimeErrorKind;
use crate::runtime::value::Value;

/// The single global scope of a run.
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, dropping whatever it was bound to before.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// A copy of the bound value. The stored value stays in place.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeErrorKind> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.to_string()))
    }

    /// Borrow without copying, for inspection.
    pub fn peek(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Drops every binding.
    pub fn shutdown(&mut self) {
        self.vars.clear();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
