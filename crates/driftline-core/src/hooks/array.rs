//! Element-level changes to one hooks array.
//!
//! A [`HookArray`] is a snapshot of the array taken from a single document
//! read. Planning consumes the snapshot, so one reconciliation call can
//! produce at most one array-mutating operation per array, and every index
//! it emits refers to that snapshot.

use serde_json::Value;

use super::entry::{HookEntry, WEB_HOOK};
use super::{DEFAULT_METHOD, HookKey, HookLocation};
use crate::document::ConfigDocument;
use crate::error::{ReconcileError, ReconcileResult};
use crate::patch::JsonPatchOp;

/// Index of the webhook with identity `(url, method)`.
///
/// Entries without a method count as `POST`; non-webhook entries never match.
pub fn find_index(array: &[Value], url: &str, method: &str) -> Option<usize> {
    array.iter().position(|item| {
        item.get("hook").and_then(Value::as_str) == Some(WEB_HOOK)
            && item.pointer("/config/url").and_then(Value::as_str) == Some(url)
            && item
                .pointer("/config/method")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_METHOD)
                == method
    })
}

/// Snapshot of a hooks array at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct HookArray {
    path: String,
    entries: Vec<Value>,
}

/// What a later read must show for a planned mutation to count as applied.
#[derive(Debug, Clone, PartialEq)]
pub enum HookExpectation {
    Present(HookEntry),
    Absent(HookKey),
}

/// One planned operation against a hooks array.
#[derive(Debug, Clone, PartialEq)]
pub struct HookMutation {
    pub op: JsonPatchOp,
    pub expect: HookExpectation,
}

impl HookArray {
    pub fn from_document(document: &ConfigDocument, location: &HookLocation) -> ReconcileResult<Self> {
        let path = location.hooks_path();
        let entries = document.array(&path)?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn find(&self, key: &HookKey) -> Option<usize> {
        find_index(&self.entries, &key.url, &key.method)
    }

    /// Decoded webhook at `key`, if present.
    pub fn get(&self, key: &HookKey) -> ReconcileResult<Option<HookEntry>> {
        match self.find(key) {
            Some(index) => Ok(HookEntry::from_value(&self.entries[index])?),
            None => Ok(None),
        }
    }

    /// Append `entry` by replacing the whole array, which works whether or
    /// not the array exists yet.
    pub fn plan_create(self, entry: &HookEntry) -> ReconcileResult<HookMutation> {
        let key = entry.key();
        if self.find(&key).is_some() {
            return Err(ReconcileError::HookExists {
                url: key.url,
                method: key.method,
                path: self.path,
            });
        }
        let mut entries = self.entries;
        entries.push(entry.to_value()?);
        Ok(HookMutation {
            op: JsonPatchOp::replace(self.path, Value::Array(entries)),
            expect: HookExpectation::Present(entry.clone()),
        })
    }

    /// Replace the entry found under its prior identity, in place.
    pub fn plan_update(self, prior: &HookKey, entry: &HookEntry) -> ReconcileResult<HookMutation> {
        let Some(index) = self.find(prior) else {
            return Err(ReconcileError::HookNotFound {
                url: prior.url.clone(),
                method: prior.method.clone(),
                path: self.path,
            });
        };
        Ok(HookMutation {
            op: JsonPatchOp::replace(format!("{}/{}", self.path, index), entry.to_value()?),
            expect: HookExpectation::Present(entry.clone()),
        })
    }

    /// Remove the entry at `key`; `None` when it is already gone.
    pub fn plan_delete(self, key: &HookKey) -> Option<HookMutation> {
        let index = self.find(key)?;
        Some(HookMutation {
            op: JsonPatchOp::remove(format!("{}/{}", self.path, index)),
            expect: HookExpectation::Absent(key.clone()),
        })
    }
}

impl HookExpectation {
    /// Whether `array` (a fresh read of the same path) reflects the mutation.
    ///
    /// The stored entry is decoded before comparing, so keys the server adds
    /// are ignored while a cleared optional field still has to read as absent.
    pub fn is_satisfied(&self, array: &[Value]) -> bool {
        match self {
            HookExpectation::Absent(key) => find_index(array, &key.url, &key.method).is_none(),
            HookExpectation::Present(entry) => {
                let key = entry.key();
                let Some(index) = find_index(array, &key.url, &key.method) else {
                    return false;
                };
                matches!(HookEntry::from_value(&array[index]), Ok(Some(stored)) if stored == *entry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::split_pointer;
    use crate::hooks::{AuthMethod, Flow, HookDeclaration, Timing};
    use crate::patch::PatchOp;
    use serde_json::json;

    fn location() -> HookLocation {
        HookLocation::new(Flow::Login, Timing::After, Some(AuthMethod::Password)).unwrap()
    }

    fn entry(url: &str) -> HookEntry {
        HookDeclaration::new("proj", location(), url).to_entry()
    }

    fn document(hooks: Value) -> ConfigDocument {
        let segments = split_pointer(&location().hooks_path()).unwrap();
        let root = segments.into_iter().rev().fold(hooks, |inner, segment| {
            let mut map = serde_json::Map::new();
            map.insert(segment, inner);
            Value::Object(map)
        });
        ConfigDocument::new(root)
    }

    #[test]
    fn find_index_matches_url_and_defaulted_method() {
        let array = vec![
            json!({"hook": "session"}),
            json!({"hook": "web_hook", "config": {"url": "https://x/y", "method": "PUT"}}),
            json!({"hook": "web_hook", "config": {"url": "https://x/y"}}),
        ];
        assert_eq!(find_index(&array, "https://x/y", "POST"), Some(2));
        assert_eq!(find_index(&array, "https://x/y", "PUT"), Some(1));
        assert_eq!(find_index(&array, "https://x/z", "POST"), None);
    }

    #[test]
    fn find_index_requires_web_hook_kind() {
        let array = vec![json!({"hook": "other", "config": {"url": "https://x/y", "method": "POST"}})];
        assert_eq!(find_index(&array, "https://x/y", "POST"), None);
    }

    #[test]
    fn create_replaces_whole_array_with_appended_entry() {
        let existing = json!([{"hook": "session"}]);
        let array = HookArray::from_document(&document(existing), &location()).unwrap();
        let mutation = array.plan_create(&entry("https://x/y")).unwrap();
        assert_eq!(mutation.op.op(), PatchOp::Replace);
        assert_eq!(mutation.op.path(), location().hooks_path());
        let value = mutation.op.value().unwrap().as_array().unwrap().clone();
        assert_eq!(value.len(), 2);
        assert_eq!(value[0], json!({"hook": "session"}));
    }

    #[test]
    fn create_works_when_array_is_missing() {
        let array = HookArray::from_document(&ConfigDocument::empty(), &location()).unwrap();
        let mutation = array.plan_create(&entry("https://x/y")).unwrap();
        assert_eq!(mutation.op.value().unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn create_duplicate_is_a_conflict() {
        let doc = document(json!([entry("https://x/y").to_value().unwrap()]));
        let array = HookArray::from_document(&doc, &location()).unwrap();
        let err = array.plan_create(&entry("https://x/y")).unwrap_err();
        assert!(matches!(err, ReconcileError::HookExists { url, method, .. } if url == "https://x/y" && method == "POST"));
    }

    #[test]
    fn update_replaces_in_place_at_prior_index() {
        let doc = document(json!([
            entry("https://a/1").to_value().unwrap(),
            entry("https://x/y").to_value().unwrap(),
        ]));
        let array = HookArray::from_document(&doc, &location()).unwrap();
        let mut updated = entry("https://x/y");
        updated.config.can_interrupt = Some(true);
        let mutation = array
            .plan_update(&HookKey::new("https://x/y", None), &updated)
            .unwrap();
        assert_eq!(mutation.op.path(), format!("{}/1", location().hooks_path()));
        assert_eq!(mutation.op.op(), PatchOp::Replace);
    }

    #[test]
    fn update_of_missing_hook_fails() {
        let array = HookArray::from_document(&document(json!([])), &location()).unwrap();
        let err = array
            .plan_update(&HookKey::new("https://x/y", None), &entry("https://x/y"))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::HookNotFound { .. }));
    }

    #[test]
    fn delete_missing_is_noop() {
        let array = HookArray::from_document(&document(json!([])), &location()).unwrap();
        assert!(array.plan_delete(&HookKey::new("https://x/y", None)).is_none());
    }

    #[test]
    fn delete_removes_by_index() {
        let doc = document(json!([
            {"hook": "session"},
            entry("https://x/y").to_value().unwrap(),
        ]));
        let array = HookArray::from_document(&doc, &location()).unwrap();
        let mutation = array.plan_delete(&HookKey::new("https://x/y", None)).unwrap();
        assert_eq!(mutation.op, JsonPatchOp::remove(format!("{}/1", location().hooks_path())));
    }

    #[test]
    fn expectation_tolerates_server_defaults() {
        let expected = entry("https://x/y");
        let stored = json!([{
            "hook": "web_hook",
            "config": {"url": "https://x/y", "method": "POST", "emit_analytics_event": true}
        }]);
        let stored = stored.as_array().unwrap();
        assert!(HookExpectation::Present(expected.clone()).is_satisfied(stored));
        assert!(!HookExpectation::Absent(expected.key()).is_satisfied(stored));
        assert!(HookExpectation::Absent(expected.key()).is_satisfied(&[]));
    }

    #[test]
    fn expectation_rejects_a_field_that_should_be_cleared() {
        let expected = entry("https://x/y");
        let stale = json!([{
            "hook": "web_hook",
            "config": {"url": "https://x/y", "method": "POST", "can_interrupt": true}
        }]);
        assert!(!HookExpectation::Present(expected).is_satisfied(stale.as_array().unwrap()));
    }

    #[test]
    fn expectation_defaults_a_missing_method() {
        let stored = json!([{"hook": "web_hook", "config": {"url": "https://x/y"}}]);
        assert!(HookExpectation::Present(entry("https://x/y")).is_satisfied(stored.as_array().unwrap()));
    }
}
