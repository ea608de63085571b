//! Driftline Core Library
//!
//! Reconciles declared configuration and webhooks into a shared, eventually
//! consistent project document. Only the fields and hooks a caller declares
//! are ever written; everything else in the document is left alone.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod hooks;
pub mod manifest;
pub mod patch;
pub mod poll;
pub mod reconcile;

/// Re-exports of commonly used types
pub mod prelude {
    // Errors
    pub use crate::error::{ReconcileError, ReconcileResult};

    // Document and patches
    pub use crate::document::ConfigDocument;
    pub use crate::patch::{JsonPatchOp, PatchOp};

    // Tracked configuration
    pub use crate::config::{DeclaredConfig, FieldDrift, PatchBuilder, TrackedFields};

    // Hooks
    pub use crate::hooks::{
        AuthMethod, Flow, HookAuth, HookDeclaration, HookId, HookLocation, Timing, hook_path,
    };

    // Polling
    pub use crate::poll::{Cancellation, PollPolicy, Poller, Sleeper};

    // Client
    pub use crate::client::{ClientConfig, ClientHandle, HttpProjectApi, ProjectApi};

    // Reconciliation
    pub use crate::reconcile::{
        HookReconciliation, ObservedConfig, ObservedHook, ReadOutcome, ReconciliationResult,
        Reconciler,
    };

    // Manifest
    pub use crate::manifest::Manifest;
}
