//! Values handed back to the caller by reconciliation calls.

use serde_json::{Map, Value};

use crate::config::FieldDrift;
use crate::document::ConfigDocument;
use crate::hooks::{HookDeclaration, HookEntry, HookId};
use crate::patch::JsonPatchOp;
use crate::poll::PollReport;

/// Result of a read: either the entity, or a signal to stop tracking it.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Found(T),
    NotFound,
}

impl<T> ReadOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            ReadOutcome::Found(value) => Some(value),
            ReadOutcome::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReadOutcome::NotFound)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadOutcome<U> {
        match self {
            ReadOutcome::Found(value) => ReadOutcome::Found(f(value)),
            ReadOutcome::NotFound => ReadOutcome::NotFound,
        }
    }
}

/// Outcome of a confirmed write.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationResult {
    pub applied_patches: Vec<JsonPatchOp>,
    pub observed_document: ConfigDocument,
    /// `None` when nothing had to be written.
    pub poll: Option<PollReport>,
}

impl ReconciliationResult {
    pub fn is_noop(&self) -> bool {
        self.applied_patches.is_empty()
    }
}

/// Tracked subset of the remote document.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedConfig {
    pub project_id: String,
    /// Remote values of tracked fields that exist remotely.
    pub values: Map<String, Value>,
    /// Declared-vs-remote differences, when a declaration was supplied.
    pub drift: Vec<FieldDrift>,
    /// Fingerprint of `values`.
    pub digest: String,
}

/// A webhook found at its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedHook {
    pub id: HookId,
    pub index: usize,
    pub entry: HookEntry,
}

impl ObservedHook {
    pub fn to_declaration(&self) -> HookDeclaration {
        HookDeclaration::from_entry(&self.id, &self.entry)
    }
}

/// A hook write together with the identifier to track it under.
#[derive(Debug, Clone, PartialEq)]
pub struct HookReconciliation {
    pub id: HookId,
    pub result: ReconciliationResult,
}
