//! Table and JSON output for CLI commands. Sensitive field values never
//! reach either format.

use anyhow::Result;
use serde_json::{Value, json};

use driftline_core::config::builder::display_value;
use driftline_core::config::{FieldDrift, fields};
use driftline_core::hooks::{HookDeclaration, HookId};
use driftline_core::manifest::Manifest;
use driftline_core::patch::JsonPatchOp;
use driftline_core::reconcile::{ObservedConfig, ReadOutcome, ReconciliationResult};

use crate::OutputFormat;

/// Remote state of a declared hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HookState {
    Missing,
    Changed,
    Converged,
}

impl HookState {
    fn as_str(&self) -> &'static str {
        match self {
            HookState::Missing => "missing",
            HookState::Changed => "changed",
            HookState::Converged => "converged",
        }
    }

    fn planned_action(&self) -> Option<&'static str> {
        match self {
            HookState::Missing => Some("create"),
            HookState::Changed => Some("update"),
            HookState::Converged => None,
        }
    }
}

const REDACTED: &str = "<redacted>";

fn op_value(op: &JsonPatchOp) -> Option<Value> {
    let value = op.value()?;
    match fields::lookup_path(op.path()) {
        Some(spec) if spec.sensitive => Some(Value::from(REDACTED)),
        _ => Some(value.clone()),
    }
}

fn op_line(op: &JsonPatchOp) -> String {
    match (op.value(), fields::lookup_path(op.path())) {
        (Some(value), Some(spec)) => format!("{} = {}", op, display_value(spec, value)),
        (Some(value), None) => format!("{} = {}", op, value),
        (None, _) => op.to_string(),
    }
}

fn ops_json(ops: &[JsonPatchOp]) -> Vec<Value> {
    ops.iter()
        .map(|op| {
            let mut entry = json!({"op": op.op().as_str(), "path": op.path()});
            if let Some(value) = op_value(op) {
                entry["value"] = value;
            }
            entry
        })
        .collect()
}

fn field_value(name: &str, value: &Value) -> Value {
    match fields::lookup(name) {
        Some(spec) if spec.sensitive => Value::from(REDACTED),
        _ => value.clone(),
    }
}

fn drift_json(drift: &FieldDrift) -> Value {
    if drift.sensitive {
        json!({"field": drift.field, "declared": REDACTED, "remote": REDACTED})
    } else {
        json!({"field": drift.field, "declared": drift.declared, "remote": drift.remote})
    }
}

fn print_json(output: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

pub(crate) fn plan(
    projects: &[(String, Vec<JsonPatchOp>)],
    hooks: &[(HookId, HookState)],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for (project_id, ops) in projects {
                if ops.is_empty() {
                    println!("• {}: configuration up to date", project_id);
                    continue;
                }
                println!("~ {}: {} change(s)", project_id, ops.len());
                for op in ops {
                    println!("    {}", op_line(op));
                }
            }
            for (id, state) in hooks {
                match state.planned_action() {
                    Some(action) => println!("~ hook {}: {}", id, action),
                    None => println!("• hook {}: up to date", id),
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "projects": projects
                    .iter()
                    .map(|(project_id, ops)| json!({"project_id": project_id, "patch": ops_json(ops)}))
                    .collect::<Vec<_>>(),
                "hooks": hooks
                    .iter()
                    .map(|(id, state)| json!({"id": id.to_string(), "action": state.planned_action()}))
                    .collect::<Vec<_>>(),
            });
            print_json(&output)?;
        }
    }
    Ok(())
}

pub(crate) fn apply(
    projects: &[(String, ReconciliationResult)],
    hooks: &[(HookId, bool)],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for (project_id, result) in projects {
                if result.is_noop() {
                    println!("• {}: already converged", project_id);
                } else {
                    println!(
                        "✓ {}: applied {} change(s)",
                        project_id,
                        result.applied_patches.len()
                    );
                }
            }
            for (id, changed) in hooks {
                if *changed {
                    println!("✓ hook {}: applied", id);
                } else {
                    println!("• hook {}: already converged", id);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "projects": projects
                    .iter()
                    .map(|(project_id, result)| json!({
                        "project_id": project_id,
                        "applied": ops_json(&result.applied_patches),
                        "poll_attempts": result.poll.map(|poll| poll.attempts),
                    }))
                    .collect::<Vec<_>>(),
                "hooks": hooks
                    .iter()
                    .map(|(id, changed)| json!({"id": id.to_string(), "changed": changed}))
                    .collect::<Vec<_>>(),
            });
            print_json(&output)?;
        }
    }
    Ok(())
}

pub(crate) fn show(
    projects: &[(String, ReadOutcome<ObservedConfig>)],
    hooks: &[(HookId, HookState)],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for (project_id, outcome) in projects {
                let ReadOutcome::Found(observed) = outcome else {
                    println!("✗ {}: project not found", project_id);
                    continue;
                };
                let short = observed.digest.get(..12).unwrap_or(&observed.digest);
                println!("{} ({})", project_id, short);
                for (name, value) in &observed.values {
                    println!("    {} = {}", name, field_value(name, value));
                }
                for drift in &observed.drift {
                    let json = drift_json(drift);
                    println!(
                        "  ⚠ {} drifted: declared {}, remote {}",
                        drift.field, json["declared"], json["remote"]
                    );
                }
            }
            for (id, state) in hooks {
                println!("hook {}: {}", id, state.as_str());
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "projects": projects
                    .iter()
                    .map(|(project_id, outcome)| match outcome {
                        ReadOutcome::Found(observed) => json!({
                            "project_id": project_id,
                            "found": true,
                            "digest": observed.digest,
                            "values": observed
                                .values
                                .iter()
                                .map(|(name, value)| (name.clone(), field_value(name, value)))
                                .collect::<serde_json::Map<_, _>>(),
                            "drift": observed.drift.iter().map(drift_json).collect::<Vec<_>>(),
                        }),
                        ReadOutcome::NotFound => json!({"project_id": project_id, "found": false}),
                    })
                    .collect::<Vec<_>>(),
                "hooks": hooks
                    .iter()
                    .map(|(id, state)| json!({"id": id.to_string(), "state": state.as_str()}))
                    .collect::<Vec<_>>(),
            });
            print_json(&output)?;
        }
    }
    Ok(())
}

pub(crate) fn imported_hook(declaration: HookDeclaration, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let snippet = Manifest {
                hooks: vec![declaration],
                ..Manifest::default()
            };
            // Only the [[hooks]] entry is meant for pasting.
            let rendered = snippet.to_toml()?;
            match rendered.find("[[hooks]]") {
                Some(start) => print!("{}", &rendered[start..]),
                None => print!("{}", rendered),
            }
        }
        OutputFormat::Json => print_json(&serde_json::to_value(&declaration)?)?,
    }
    Ok(())
}

pub(crate) fn deleted_hook(id: &HookId, removed: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if removed {
                println!("✓ Deleted hook {}", id);
            } else {
                println!("• Hook {} was already absent", id);
            }
        }
        OutputFormat::Json => print_json(&json!({"id": id.to_string(), "removed": removed}))?,
    }
    Ok(())
}
