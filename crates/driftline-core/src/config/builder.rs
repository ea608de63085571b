//! Builds JSON Patch batches from a declared configuration.

use serde_json::Value;

use super::fields::{self, FieldSpec};
use super::tracked::{DeclaredConfig, TrackedFields};
use crate::document::ConfigDocument;
use crate::error::ReconcileResult;
use crate::patch::JsonPatchOp;

/// Converts tracked declarations into patch operations against the known
/// path layout.
///
/// Every tracked field maps to at most one operation: `add` when the
/// document has nothing at the field's path, `replace` otherwise. Lists are
/// replaced whole. Fields whose remote value already equals the declared
/// value are skipped unless `force` is set, so rebuilding against a
/// converged document yields an empty batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchBuilder {
    force: bool,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit operations for converged fields too.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn build(
        &self,
        tracked: &TrackedFields,
        declared: &DeclaredConfig,
        remote: &ConfigDocument,
    ) -> ReconcileResult<Vec<JsonPatchOp>> {
        // Resolve every name up front so a typo fails before anything is emitted.
        let specs = declared
            .iter()
            .map(|(name, value)| Ok((fields::require(name)?, value)))
            .collect::<ReconcileResult<Vec<(&'static FieldSpec, &Value)>>>()?;
        tracked.validate()?;

        let mut ops = Vec::new();
        for (spec, declared_value) in specs {
            if !tracked.contains(spec.name) {
                continue;
            }
            let op = match remote.get(spec.path) {
                None => JsonPatchOp::add(spec.path, declared_value.clone()),
                Some(current) if current == declared_value && !self.force => {
                    tracing::trace!(field = spec.name, "Field already converged");
                    continue;
                }
                Some(_) => JsonPatchOp::replace(spec.path, declared_value.clone()),
            };
            tracing::debug!(
                field = spec.name,
                op = %op,
                value = %display_value(spec, declared_value),
                "Planned field patch"
            );
            ops.push(op);
        }
        Ok(ops)
    }
}

/// Value as it may appear in logs and plan output.
pub fn display_value(spec: &FieldSpec, value: &Value) -> String {
    if spec.sensitive {
        "<redacted>".to_string()
    } else {
        value.to_string()
    }
}
