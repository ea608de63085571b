//! Flow webhooks stored in the project document's `hooks` arrays.
//!
//! Hooks live at a path chosen by flow, timing and (for `after` hooks) the
//! authentication method that completed:
//! - `before`: `.../selfservice/flows/<flow>/before/hooks`
//! - `after`:  `.../selfservice/flows/<flow>/after/<auth_method>/hooks`
//!
//! Within one array a webhook is identified by `(url, method)`.

pub mod array;
pub mod entry;
pub mod id;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::fields::selfservice_root;
use crate::error::{ReconcileError, ReconcileResult};

pub use array::{HookArray, HookExpectation, HookMutation};
pub use entry::{ApiKeyLocation, HookAuth, HookDeclaration, HookEntry, HookResponse, WebHookConfig};
pub use id::HookId;

/// Method assumed for entries that carry none.
pub const DEFAULT_METHOD: &str = "POST";

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ReconcileError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ReconcileError::invalid_value(
                        $what,
                        format!(
                            "unknown {} '{}' (expected one of: {})",
                            $what,
                            other,
                            [$($text),+].join(", ")
                        ),
                    )),
                }
            }
        }
    };
}

named_enum!(
    /// Self-service flow a hook is attached to.
    Flow, "flow" {
        Login => "login",
        Registration => "registration",
        Recovery => "recovery",
        Settings => "settings",
        Verification => "verification",
    }
);

named_enum!(
    /// Whether the hook runs before the flow starts or after it completes.
    Timing, "timing" {
        Before => "before",
        After => "after",
    }
);

named_enum!(
    /// Authentication method that completed an `after` flow.
    AuthMethod, "auth_method" {
        Password => "password",
        Oidc => "oidc",
        Code => "code",
        Webauthn => "webauthn",
        Passkey => "passkey",
        Totp => "totp",
        LookupSecret => "lookup_secret",
        Profile => "profile",
    }
);

/// The `(flow, timing, auth_method?)` triple that selects a hooks array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookLocation {
    flow: Flow,
    timing: Timing,
    auth_method: Option<AuthMethod>,
}

impl HookLocation {
    /// `after` requires an auth method. A `before` location may carry one,
    /// but it does not take part in the array path.
    pub fn new(flow: Flow, timing: Timing, auth_method: Option<AuthMethod>) -> ReconcileResult<Self> {
        if timing == Timing::After && auth_method.is_none() {
            return Err(ReconcileError::IncompleteKey {
                entity: format!("after-{} hook", flow),
                missing: "auth_method".to_string(),
            });
        }
        Ok(Self {
            flow,
            timing,
            auth_method,
        })
    }

    /// Parse from the textual parts used in declarations and identifiers.
    /// An empty `auth_method` means none.
    pub fn parse(flow: &str, timing: &str, auth_method: &str) -> ReconcileResult<Self> {
        let auth_method = if auth_method.is_empty() {
            None
        } else {
            Some(auth_method.parse()?)
        };
        Self::new(flow.parse()?, timing.parse()?, auth_method)
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn auth_method(&self) -> Option<AuthMethod> {
        self.auth_method
    }

    /// JSON pointer of the hooks array for this location.
    pub fn hooks_path(&self) -> String {
        match (self.timing, self.auth_method) {
            (Timing::After, Some(method)) => format!(
                "{}/flows/{}/after/{}/hooks",
                selfservice_root(),
                self.flow,
                method
            ),
            _ => format!(
                "{}/flows/{}/{}/hooks",
                selfservice_root(),
                self.flow,
                self.timing
            ),
        }
    }
}

/// Hooks array path for `(flow, timing, auth_method)`.
pub fn hook_path(flow: &str, timing: &str, auth_method: &str) -> ReconcileResult<String> {
    Ok(HookLocation::parse(flow, timing, auth_method)?.hooks_path())
}

impl fmt::Display for HookLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.auth_method {
            Some(method) => write!(f, "{}/{}/{}", self.flow, self.timing, method),
            None => write!(f, "{}/{}", self.flow, self.timing),
        }
    }
}

/// Composite identity of a webhook within its array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookKey {
    pub url: String,
    pub method: String,
}

impl HookKey {
    pub fn new(url: impl Into<String>, method: Option<&str>) -> Self {
        Self {
            url: url.into(),
            method: method.unwrap_or(DEFAULT_METHOD).to_string(),
        }
    }
}

impl fmt::Display for HookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
