//! Path-addressed access to the project configuration document.
//!
//! The remote document is an untyped JSON tree. Every lookup goes through a
//! JSON pointer, and a missing segment, a type mismatch along the way, or an
//! explicit `null` all collapse into the same "not found" answer.

use serde_json::{Map, Value};

/// Split a JSON pointer into unescaped segments.
pub fn split_pointer(pointer: &str) -> anyhow::Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| anyhow::anyhow!("JSON pointer must start with '/': {}", pointer))?;
    Ok(rest
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// True when `ancestor` is a strict prefix of `path` at a segment boundary.
pub fn is_strict_ancestor(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Transient view of a project configuration document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Value at `pointer`, treating `null` as absent.
    pub fn get(&self, pointer: &str) -> Option<&Value> {
        match self.root.pointer(pointer) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    pub fn contains(&self, pointer: &str) -> bool {
        self.get(pointer).is_some()
    }

    /// Array at `pointer`; a missing array reads as empty.
    pub fn array(&self, pointer: &str) -> anyhow::Result<Vec<Value>> {
        match self.get(pointer) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => anyhow::bail!("Expected '{}' to be a JSON array", pointer),
        }
    }
}
