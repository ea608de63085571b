//! Error taxonomy for reconciliation calls.
//!
//! Configuration and conflict errors are raised before any remote call.
//! Remote failures pass through unchanged. "Not found" on read is not an
//! error; see [`crate::reconcile::ReadOutcome`].

use std::time::Duration;

/// Errors surfaced by the reconciliation engine.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A declared attribute has no entry in the known path table.
    #[error("Unknown configuration attribute '{0}': it has no known path in the project document")]
    UnknownField(String),

    /// Two fields that cannot be combined were both supplied.
    #[error("'{first}' cannot be combined with '{second}': {reason}")]
    MutuallyExclusive {
        first: String,
        second: String,
        reason: String,
    },

    /// A required part of a composite key is missing.
    #[error("Incomplete key for {entity}: '{missing}' is required")]
    IncompleteKey { entity: String, missing: String },

    /// A hook identifier did not have the expected shape.
    #[error(
        "Invalid hook identifier '{id}': expected project_id:flow:timing:auth_method:method:url ({reason})"
    )]
    InvalidHookId { id: String, reason: String },

    /// A declared value is structurally unusable (bad URL, unknown flow name, ...).
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// A hook with the same (url, method) identity already exists.
    #[error("Hook already exists: {method} {url} at {path}")]
    HookExists {
        url: String,
        method: String,
        path: String,
    },

    /// The hook being updated is gone from the remote array.
    #[error("Hook not found: {method} {url} at {path} (it may have been deleted outside driftline)")]
    HookNotFound {
        url: String,
        method: String,
        path: String,
    },

    /// The remote document did not reflect the applied patch in time.
    #[error(
        "Remote document did not converge after {attempts} attempts ({waited:?} waited); \
         the change may have been partially applied, re-read before retrying"
    )]
    ConsistencyTimeout { attempts: u32, waited: Duration },

    /// The caller cancelled or the deadline passed while polling.
    #[error("Polling cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// Failure reported by the remote API or transport.
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl ReconcileError {
    /// True for errors raised before any remote call was made.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownField(_)
                | Self::MutuallyExclusive { .. }
                | Self::IncompleteKey { .. }
                | Self::InvalidHookId { .. }
                | Self::InvalidValue { .. }
        )
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_attempts_and_wait() {
        let err = ReconcileError::ConsistencyTimeout {
            attempts: 10,
            waited: Duration::from_millis(4500),
        };
        let message = err.to_string();
        assert!(message.contains("10 attempts"));
        assert!(message.contains("4.5s"));
        assert!(message.contains("partially applied"));
    }

    #[test]
    fn remote_errors_are_transparent() {
        let err = ReconcileError::from(anyhow::anyhow!("HTTP 502 from upstream"));
        assert_eq!(err.to_string(), "HTTP 502 from upstream");
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(ReconcileError::UnknownField("nope".into()).is_configuration_error());
        assert!(
            ReconcileError::IncompleteKey {
                entity: "hook".into(),
                missing: "auth_method".into(),
            }
            .is_configuration_error()
        );
        assert!(
            !ReconcileError::HookExists {
                url: "https://x/y".into(),
                method: "POST".into(),
                path: "/a".into(),
            }
            .is_configuration_error()
        );
    }
}
