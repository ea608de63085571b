//! Content fingerprints for observed configuration subsets.
//!
//! Maps keep insertion order, so the same content can arrive with its keys
//! in any order. Keys are sorted at every level before hashing.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Stable blake3 digest of a JSON value; object key order does not matter.
pub fn hash_json(value: &Value) -> String {
    let bytes = serde_json::to_vec(&canonical(value)).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// Digest of the tracked subset of a document.
pub fn hash_subset(subset: &Map<String, Value>) -> String {
    hash_json(&Value::Object(subset.clone()))
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&str, Value> = map
                .iter()
                .map(|(key, child)| (key.as_str(), canonical(child)))
                .collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(key, child)| (key.to_string(), child))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_ignores_key_order() {
        let a = json!({"cors_enabled": true, "cors_origins": ["x"]});
        let b = json!({"cors_origins": ["x"], "cors_enabled": true});
        assert_eq!(hash_json(&a), hash_json(&b));
    }

    #[test]
    fn digest_respects_array_order() {
        let a = json!({"cors_origins": ["x", "y"]});
        let b = json!({"cors_origins": ["y", "x"]});
        assert_ne!(hash_json(&a), hash_json(&b));
    }

    #[test]
    fn canonical_form_sorts_nested_keys() {
        let value = json!({"b": {"y": 1, "x": 2}, "a": true});
        assert_eq!(
            serde_json::to_string(&canonical(&value)).unwrap(),
            r#"{"a":true,"b":{"x":2,"y":1}}"#
        );
        assert_ne!(
            serde_json::to_string(&value).unwrap(),
            serde_json::to_string(&canonical(&value)).unwrap()
        );
    }
}
