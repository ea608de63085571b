//! Property tests for patch planning and hook identifiers.

mod support;

use std::collections::BTreeSet;

use driftline_core::config::{DeclaredConfig, FIELDS, PatchBuilder};
use driftline_core::document::ConfigDocument;
use driftline_core::hooks::{AuthMethod, Flow, HookId, HookKey, HookLocation, Timing, hook_path};
use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use serde_json::{Value, json};
use support::{apply_lenient, set_path};

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z0-9]{0,8}".prop_map(Value::from),
        prop::collection::vec("[a-z]{1,6}", 0..3).prop_map(|items| json!(items)),
    ]
}

fn field_names() -> Vec<&'static str> {
    FIELDS.iter().map(|spec| spec.name).collect()
}

fn path_of(name: &str) -> &'static str {
    FIELDS
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| spec.path)
        .unwrap()
}

fn arb_location() -> impl Strategy<Value = HookLocation> {
    (select(Flow::ALL.to_vec()), select(AuthMethod::ALL.to_vec()), any::<bool>()).prop_map(
        |(flow, auth_method, after)| {
            if after {
                HookLocation::new(flow, Timing::After, Some(auth_method)).unwrap()
            } else {
                HookLocation::new(flow, Timing::Before, None).unwrap()
            }
        },
    )
}

proptest! {
    /// Forced plans touch exactly the declared paths, once each; applying a
    /// plan converges so the next plan is empty.
    #[test]
    fn plan_covers_exactly_the_tracked_paths(
        names in subsequence(field_names(), 0..=8),
        values in prop::collection::vec(arb_value(), 8),
        present in prop::collection::vec(any::<bool>(), 8),
    ) {
        let mut remote = json!({"untracked": {"keep": [1, 2]}});
        let mut declared = DeclaredConfig::new();
        for (index, name) in names.iter().enumerate() {
            if present[index] {
                set_path(&mut remote, path_of(name), json!("remote")).unwrap();
            }
            declared.set(*name, values[index].clone());
        }
        let tracked = declared.tracked_fields();

        let document = ConfigDocument::new(remote.clone());
        let ops = PatchBuilder::new().force(true).build(&tracked, &declared, &document).unwrap();
        let op_paths: BTreeSet<&str> = ops.iter().map(|op| op.path()).collect();
        let expected: BTreeSet<&str> = names.iter().map(|name| path_of(name)).collect();
        prop_assert_eq!(ops.len(), names.len());
        prop_assert_eq!(op_paths, expected);

        apply_lenient(&mut remote, &ops).unwrap();
        let document = ConfigDocument::new(remote);
        let again = PatchBuilder::new().build(&tracked, &declared, &document).unwrap();
        prop_assert!(again.is_empty());
        prop_assert_eq!(document.get("/untracked/keep"), Some(&json!([1, 2])));
    }

    #[test]
    fn hook_id_round_trips(
        project_id in "[a-z0-9][a-z0-9-]{0,15}",
        location in arb_location(),
        method in select(vec!["POST", "GET", "PUT", "PATCH"]),
        url in "https://[a-z]{1,10}\\.example\\.com(:[0-9]{2,4})?(/[a-z0-9:]{0,10})?",
    ) {
        let id = HookId::new(project_id, location, HookKey::new(url, Some(method)));
        let parsed = HookId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn before_hooks_ignore_auth_method(
        flow in select(Flow::ALL.to_vec()),
        auth_method in select(AuthMethod::ALL.to_vec()),
    ) {
        prop_assert_eq!(
            hook_path(flow.as_str(), "before", auth_method.as_str()).unwrap(),
            hook_path(flow.as_str(), "before", "").unwrap()
        );
    }
}
