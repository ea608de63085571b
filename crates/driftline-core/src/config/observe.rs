//! Read-side intersection of the remote document with tracked fields.

use serde::Serialize;
use serde_json::{Map, Value};

use super::fields;
use super::tracked::{DeclaredConfig, TrackedFields};
use crate::document::ConfigDocument;
use crate::error::ReconcileResult;

/// Remote values of tracked fields only; fields absent remotely are omitted.
pub fn observe_tracked(
    tracked: &TrackedFields,
    remote: &ConfigDocument,
) -> ReconcileResult<Map<String, Value>> {
    let mut observed = Map::new();
    for name in tracked.iter() {
        let spec = fields::require(name)?;
        if let Some(value) = remote.get(spec.path) {
            observed.insert(name.to_string(), value.clone());
        }
    }
    Ok(observed)
}

/// A tracked field whose remote value differs from the declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDrift {
    pub field: String,
    pub declared: Value,
    /// `None` when the remote document has nothing at the field's path.
    pub remote: Option<Value>,
    #[serde(skip)]
    pub sensitive: bool,
}

/// Compare declared values against the observed subset.
pub fn detect_drift(
    tracked: &TrackedFields,
    declared: &DeclaredConfig,
    observed: &Map<String, Value>,
) -> ReconcileResult<Vec<FieldDrift>> {
    let mut drift = Vec::new();
    for (name, declared_value) in declared.iter() {
        if !tracked.contains(name) {
            continue;
        }
        let spec = fields::require(name)?;
        let remote = observed.get(name);
        if remote != Some(declared_value) {
            drift.push(FieldDrift {
                field: name.to_string(),
                declared: declared_value.clone(),
                remote: remote.cloned(),
                sensitive: spec.sensitive,
            });
        }
    }
    Ok(drift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote() -> ConfigDocument {
        ConfigDocument::new(json!({
            "cors_public": {"enabled": true, "origins": ["https://a.example.com"]},
            "services": {"identity": {"config": {"session": {"lifespan": "1h"}}}}
        }))
    }

    #[test]
    fn untracked_remote_values_are_not_reported() {
        let tracked = TrackedFields::from_names(["cors_enabled", "smtp_from_name"]);
        let observed = observe_tracked(&tracked, &remote()).unwrap();
        assert_eq!(observed.len(), 1);
        assert_eq!(observed.get("cors_enabled"), Some(&json!(true)));
        assert!(!observed.contains_key("session_lifespan"));
    }

    #[test]
    fn drift_lists_differing_and_missing_fields() {
        let declared = DeclaredConfig::new()
            .with("cors_enabled", json!(true))
            .with("cors_origins", json!(["https://b.example.com"]))
            .with("smtp_from_name", json!("Team"));
        let tracked = declared.tracked_fields();
        let observed = observe_tracked(&tracked, &remote()).unwrap();
        let drift = detect_drift(&tracked, &declared, &observed).unwrap();
        let names: Vec<_> = drift.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(names, vec!["cors_origins", "smtp_from_name"]);
        assert_eq!(drift[1].remote, None);
    }
}
