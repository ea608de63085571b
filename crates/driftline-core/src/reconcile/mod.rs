//! Lifecycle orchestration over the project document.
//!
//! Each call runs to completion on the calling thread:
//! - create / update: validate, fetch, build a patch, apply, poll until a
//!   read reflects it
//! - read: fetch, keep only what the caller tracks, signal "not found"
//!   instead of failing
//! - delete: locate, no-op when already gone, otherwise remove and poll
//!
//! Remote failures are returned as-is. Nothing here retries except through
//! the [`Poller`].

pub mod outcome;

use crate::client::ProjectApi;
use crate::config::{
    DeclaredConfig, PatchBuilder, TrackedFields, detect_drift, fields, hash_subset,
    observe_tracked,
};
use crate::document::ConfigDocument;
use crate::error::{ReconcileError, ReconcileResult};
use crate::hooks::{HookArray, HookDeclaration, HookEntry, HookExpectation, HookId, HookMutation};
use crate::patch::{JsonPatchOp, PatchOp};
use crate::poll::{PollPolicy, Poller};

pub use outcome::{
    HookReconciliation, ObservedConfig, ObservedHook, ReadOutcome, ReconciliationResult,
};

/// Drives create/read/update/delete of tracked configuration and hooks.
#[derive(Debug)]
pub struct Reconciler<A> {
    api: A,
    poller: Poller,
}

impl<A: ProjectApi> Reconciler<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            poller: Poller::default(),
        }
    }

    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // ---- tracked configuration -------------------------------------------

    /// Patch that [`Reconciler::update_config`] would send right now.
    pub fn plan_config(
        &self,
        project_id: &str,
        declared: &DeclaredConfig,
    ) -> ReconcileResult<Vec<JsonPatchOp>> {
        let tracked = declared.tracked_fields();
        tracked.validate()?;
        let document = self.fetch(project_id)?;
        PatchBuilder::new().build(&tracked, declared, &document)
    }

    pub fn create_config(
        &self,
        project_id: &str,
        declared: &DeclaredConfig,
    ) -> ReconcileResult<ReconciliationResult> {
        self.apply_config(project_id, declared)
    }

    /// Converge the declared attributes. Attributes dropped from the
    /// declaration are released, not reverted.
    pub fn update_config(
        &self,
        project_id: &str,
        declared: &DeclaredConfig,
    ) -> ReconcileResult<ReconciliationResult> {
        self.apply_config(project_id, declared)
    }

    /// Remote values of `tracked` fields, plus drift against `declared`.
    pub fn read_config(
        &self,
        project_id: &str,
        tracked: &TrackedFields,
        declared: Option<&DeclaredConfig>,
    ) -> ReconcileResult<ReadOutcome<ObservedConfig>> {
        tracked.validate()?;
        let Some(document) = self.fetch_for_read(project_id)? else {
            tracing::debug!(project_id, "Project not found, dropping tracked configuration");
            return Ok(ReadOutcome::NotFound);
        };
        let values = observe_tracked(tracked, &document)?;
        let drift = match declared {
            Some(declared) => detect_drift(tracked, declared, &values)?,
            None => Vec::new(),
        };
        let digest = hash_subset(&values);
        Ok(ReadOutcome::Found(ObservedConfig {
            project_id: project_id.to_string(),
            values,
            drift,
            digest,
        }))
    }

    /// The project document outlives this resource; nothing is written.
    pub fn delete_config(&self, project_id: &str, tracked: &TrackedFields) -> ReconcileResult<()> {
        tracing::info!(
            project_id,
            fields = tracked.len(),
            "Released tracked configuration without remote changes"
        );
        Ok(())
    }

    /// Declaration of the named attributes as currently set remotely.
    /// Attributes with no remote value are left out.
    pub fn import_config(
        &self,
        project_id: &str,
        attributes: &[&str],
    ) -> ReconcileResult<ReadOutcome<DeclaredConfig>> {
        let tracked = TrackedFields::from_names(attributes.iter().copied());
        tracked.validate()?;
        let Some(document) = self.fetch_for_read(project_id)? else {
            return Ok(ReadOutcome::NotFound);
        };
        let mut declared = DeclaredConfig::new();
        for name in attributes {
            let spec = fields::require(name)?;
            if let Some(value) = document.get(spec.path) {
                declared.set(*name, value.clone());
            }
        }
        Ok(ReadOutcome::Found(declared))
    }

    fn apply_config(
        &self,
        project_id: &str,
        declared: &DeclaredConfig,
    ) -> ReconcileResult<ReconciliationResult> {
        let tracked = declared.tracked_fields();
        tracked.validate()?;
        let document = self.fetch(project_id)?;
        let ops = PatchBuilder::new().build(&tracked, declared, &document)?;
        if ops.is_empty() {
            tracing::debug!(project_id, "Tracked configuration already converged");
            return Ok(ReconciliationResult {
                applied_patches: ops,
                observed_document: document,
                poll: None,
            });
        }

        let expected = ops.clone();
        self.apply_and_confirm(project_id, ops, move |document| {
            Ok(reflects_fields(document, &expected))
        })
    }

    // ---- hooks -------------------------------------------------------------

    pub fn create_hook(&self, declaration: &HookDeclaration) -> ReconcileResult<HookReconciliation> {
        declaration.validate()?;
        let id = declaration.id()?;
        let entry = declaration.to_entry();
        let document = self.fetch(&id.project_id)?;
        let mutation = HookArray::from_document(&document, &id.location)?.plan_create(&entry)?;
        let result = self.apply_hook_mutation(&id, mutation)?;
        Ok(HookReconciliation { id, result })
    }

    pub fn read_hook(&self, id: &HookId) -> ReconcileResult<ReadOutcome<ObservedHook>> {
        let Some(document) = self.fetch_for_read(&id.project_id)? else {
            return Ok(ReadOutcome::NotFound);
        };
        let array = HookArray::from_document(&document, &id.location)?;
        let found = match array.find(&id.key) {
            Some(index) => HookEntry::from_value(&array.entries()[index])?
                .map(|entry| (index, entry)),
            None => None,
        };
        match found {
            Some((index, entry)) => Ok(ReadOutcome::Found(ObservedHook {
                id: id.clone(),
                index,
                entry,
            })),
            None => {
                tracing::debug!(hook = %id, "Hook not found, dropping it from tracked state");
                Ok(ReadOutcome::NotFound)
            }
        }
    }

    /// Locate the hook by its `prior` identity and replace the non-identity
    /// fields with `declaration`'s.
    pub fn update_hook(
        &self,
        prior: &HookId,
        declaration: &HookDeclaration,
    ) -> ReconcileResult<HookReconciliation> {
        declaration.validate()?;
        let id = declaration.id()?;
        ensure_same_identity(prior, &id)?;

        let entry = declaration.to_entry();
        let document = self.fetch(&prior.project_id)?;
        let array = HookArray::from_document(&document, &prior.location)?;
        // Compared decoded so server defaults and an omitted method still match.
        if array.get(&prior.key)?.as_ref() == Some(&entry) {
            tracing::debug!(hook = %prior, "Hook already converged");
            return Ok(HookReconciliation {
                id,
                result: ReconciliationResult {
                    applied_patches: Vec::new(),
                    observed_document: document,
                    poll: None,
                },
            });
        }
        let mutation = array.plan_update(&prior.key, &entry)?;
        let result = self.apply_hook_mutation(&id, mutation)?;
        Ok(HookReconciliation { id, result })
    }

    /// Remove the hook. `None` when it (or its project) is already gone.
    pub fn delete_hook(&self, id: &HookId) -> ReconcileResult<Option<ReconciliationResult>> {
        let Some(document) = self.api.fetch_config(&id.project_id)? else {
            tracing::debug!(hook = %id, "Project gone, hook delete is a no-op");
            return Ok(None);
        };
        let document = ConfigDocument::new(document);
        let Some(mutation) = HookArray::from_document(&document, &id.location)?.plan_delete(&id.key)
        else {
            tracing::debug!(hook = %id, "Hook already absent, delete is a no-op");
            return Ok(None);
        };
        self.apply_hook_mutation(id, mutation).map(Some)
    }

    /// Parse an identifier and read the hook it names as a declaration.
    pub fn import_hook(&self, id: &str) -> ReconcileResult<ReadOutcome<HookDeclaration>> {
        let id = HookId::parse(id)?;
        Ok(self.read_hook(&id)?.map(|observed| observed.to_declaration()))
    }

    // ---- shared plumbing ---------------------------------------------------

    fn apply_hook_mutation(
        &self,
        id: &HookId,
        mutation: HookMutation,
    ) -> ReconcileResult<ReconciliationResult> {
        let HookMutation { op, expect } = mutation;
        let path = id.location.hooks_path();
        tracing::debug!(hook = %id, op = %op, "Planned hook patch");
        self.apply_and_confirm(&id.project_id, vec![op], move |document| {
            Ok(reflects_hook(document, &path, &expect)?)
        })
    }

    fn apply_and_confirm<F>(
        &self,
        project_id: &str,
        ops: Vec<JsonPatchOp>,
        mut converged: F,
    ) -> ReconcileResult<ReconciliationResult>
    where
        F: FnMut(&ConfigDocument) -> ReconcileResult<bool>,
    {
        tracing::info!(project_id, operations = ops.len(), "Applying project patch");
        self.api.patch_config(project_id, &ops)?;

        let mut observed = None;
        let report = self.poller.wait_for(|| {
            let Some(document) = self.api.fetch_config(project_id)? else {
                return Ok(false);
            };
            let document = ConfigDocument::new(document);
            let done = converged(&document)?;
            observed = Some(document);
            Ok(done)
        })?;
        let observed_document = observed.ok_or_else(|| {
            anyhow::anyhow!("Project {} converged without an observed document", project_id)
        })?;

        Ok(ReconciliationResult {
            applied_patches: ops,
            observed_document,
            poll: Some(report),
        })
    }

    /// Document for a write; a missing project is a remote error here.
    fn fetch(&self, project_id: &str) -> ReconcileResult<ConfigDocument> {
        match self.api.fetch_config(project_id)? {
            Some(document) => Ok(ConfigDocument::new(document)),
            None => Err(anyhow::anyhow!("Project {} not found", project_id).into()),
        }
    }

    /// Document for a plain read, giving a just-created project a short
    /// window to appear. `None` means "stop tracking".
    fn fetch_for_read(&self, project_id: &str) -> ReconcileResult<Option<ConfigDocument>> {
        let mut found = None;
        let outcome = self.poller.wait_for_with(PollPolicy::read(), || {
            found = self.api.fetch_config(project_id)?;
            Ok(found.is_some())
        });
        match outcome {
            Ok(_) => Ok(found.map(ConfigDocument::new)),
            Err(ReconcileError::ConsistencyTimeout { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn ensure_same_identity(prior: &HookId, next: &HookId) -> ReconcileResult<()> {
    let changed = if prior.project_id != next.project_id {
        Some("project_id")
    } else if prior.location.flow() != next.location.flow() {
        Some("flow")
    } else if prior.location.timing() != next.location.timing() {
        Some("timing")
    } else if prior.location.auth_method() != next.location.auth_method() {
        Some("auth_method")
    } else if prior.key.url != next.key.url {
        Some("url")
    } else if prior.key.method != next.key.method {
        Some("method")
    } else {
        None
    };
    match changed {
        Some(field) => Err(ReconcileError::invalid_value(
            field,
            format!(
                "identity fields are immutable (hook {}); delete and recreate the hook instead",
                prior
            ),
        )),
        None => Ok(()),
    }
}

fn reflects_fields(document: &ConfigDocument, ops: &[JsonPatchOp]) -> bool {
    ops.iter().all(|op| match op.op() {
        PatchOp::Add | PatchOp::Replace => {
            document.get(op.path()) == op.value().filter(|v| !v.is_null())
        }
        PatchOp::Remove => !document.contains(op.path()),
    })
}

fn reflects_hook(
    document: &ConfigDocument,
    path: &str,
    expect: &HookExpectation,
) -> anyhow::Result<bool> {
    Ok(expect.is_satisfied(&document.array(path)?))
}
