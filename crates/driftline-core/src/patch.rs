//! JSON Patch operations sent to the project API.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// The subset of RFC 6902 operations the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Replace => "replace",
            PatchOp::Remove => "remove",
        }
    }
}

/// A single `{op, path, value?}` entry.
///
/// Built only through [`JsonPatchOp::add`], [`JsonPatchOp::replace`] and
/// [`JsonPatchOp::remove`], so a `remove` never carries a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonPatchOp {
    op: PatchOp,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl JsonPatchOp {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    pub fn op(&self) -> PatchOp {
        self.op
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl fmt::Display for JsonPatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.as_str(), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remove_serializes_without_value() {
        let op = JsonPatchOp::remove("/services/identity/config/selfservice/flows/login/before/hooks/0");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "remove", "path": "/services/identity/config/selfservice/flows/login/before/hooks/0"})
        );
        assert!(op.value().is_none());
    }

    #[test]
    fn add_and_replace_carry_values() {
        let ops = vec![
            JsonPatchOp::add("/cors_public/enabled", json!(true)),
            JsonPatchOp::replace("/cors_public/origins", json!(["https://app.example.com"])),
        ];
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([
                {"op": "add", "path": "/cors_public/enabled", "value": true},
                {"op": "replace", "path": "/cors_public/origins", "value": ["https://app.example.com"]}
            ])
        );
    }

    #[test]
    fn display_names_op_and_path() {
        let op = JsonPatchOp::replace("/cors_public/enabled", json!(false));
        assert_eq!(op.to_string(), "replace /cors_public/enabled");
    }
}
