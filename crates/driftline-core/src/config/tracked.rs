//! Declared configuration and the set of attributes it tracks.

use std::collections::BTreeSet;

use serde_json::Value;

use super::fields;
use crate::error::ReconcileResult;

/// Attributes the caller assigned, in declaration order.
///
/// An attribute is either present with a value or not present at all;
/// `null` means "unset" and removes the attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredConfig {
    entries: Vec<(String, Value)>,
}

impl DeclaredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `name`. Re-assigning keeps the original position.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        let name = name.into();
        if value.is_null() {
            self.unset(&name);
            return self;
        }
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn unset(&mut self, name: &str) {
        self.entries.retain(|(existing, _)| existing != name);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of every present attribute, regardless of value.
    pub fn tracked_fields(&self) -> TrackedFields {
        TrackedFields {
            names: self.entries.iter().map(|(name, _)| name.clone()).collect(),
        }
    }
}

impl FromIterator<(String, Value)> for DeclaredConfig {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut config = DeclaredConfig::new();
        for (name, value) in iter {
            config.set(name, value);
        }
        config
    }
}

/// Attribute names explicitly declared by the caller.
///
/// Derived fresh on every call; anything outside this set is never written
/// and never compared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFields {
    names: BTreeSet<String>,
}

impl TrackedFields {
    /// Rebuild from names persisted by the host tool.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Fail on the first name missing from the path table.
    pub fn validate(&self) -> ReconcileResult<()> {
        for name in &self.names {
            fields::require(name)?;
        }
        Ok(())
    }
}
