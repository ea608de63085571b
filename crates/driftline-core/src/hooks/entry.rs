//! Webhook entry shapes: the declared form and the stored form.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::HookId;
use super::{DEFAULT_METHOD, HookKey, HookLocation};
use crate::error::{ReconcileError, ReconcileResult};

/// Discriminator of webhook entries; other hook kinds share the arrays.
pub const WEB_HOOK: &str = "web_hook";

const BODY_SCHEMES: &[&str] = &["base64://", "file://", "http://", "https://"];

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

/// An entry as stored in a hooks array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEntry {
    pub hook: String,
    pub config: WebHookConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebHookConfig {
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HookResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_interrupt: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<HookAuth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookResponse {
    /// Deliver without waiting for the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<bool>,

    /// Parse the response body to update the identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<bool>,
}

/// Credentials attached to webhook deliveries.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum HookAuth {
    ApiKey {
        name: String,
        value: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    BasicAuth {
        user: String,
        password: String,
    },
}

impl fmt::Debug for HookAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookAuth::ApiKey { name, location, .. } => f
                .debug_struct("ApiKey")
                .field("name", name)
                .field("value", &"<redacted>")
                .field("location", location)
                .finish(),
            HookAuth::BasicAuth { user, .. } => f
                .debug_struct("BasicAuth")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Cookie,
}

impl HookEntry {
    pub fn key(&self) -> HookKey {
        HookKey::new(self.config.url.clone(), Some(&self.config.method))
    }

    pub fn to_value(&self) -> ReconcileResult<Value> {
        serde_json::to_value(self)
            .map_err(|err| ReconcileError::invalid_value("hook", err.to_string()))
    }

    /// Decode a stored entry; `None` for entries that are not webhooks.
    pub fn from_value(value: &Value) -> anyhow::Result<Option<Self>> {
        if value.get("hook").and_then(Value::as_str) != Some(WEB_HOOK) {
            return Ok(None);
        }
        let entry = serde_json::from_value(value.clone())
            .map_err(|err| anyhow::anyhow!("Malformed web_hook entry: {}", err))?;
        Ok(Some(entry))
    }
}

/// Encode an inline Jsonnet body as a `base64://` URI; URIs pass through.
pub fn encode_body(body: &str) -> String {
    if BODY_SCHEMES.iter().any(|scheme| body.starts_with(scheme)) {
        body.to_string()
    } else {
        format!("base64://{}", STANDARD.encode(body.as_bytes()))
    }
}

/// A webhook as declared by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDeclaration {
    pub project_id: String,
    pub flow: String,
    pub timing: String,
    #[serde(default)]
    pub auth_method: Option<String>,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub response_ignore: Option<bool>,
    #[serde(default)]
    pub response_parse: Option<bool>,
    #[serde(default)]
    pub can_interrupt: Option<bool>,
    #[serde(default)]
    pub auth: Option<HookAuth>,
}

impl HookDeclaration {
    pub fn new(
        project_id: impl Into<String>,
        location: HookLocation,
        url: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            flow: location.flow().to_string(),
            timing: location.timing().to_string(),
            auth_method: location.auth_method().map(|method| method.to_string()),
            url: url.into(),
            method: default_method(),
            body: None,
            response_ignore: None,
            response_parse: None,
            can_interrupt: None,
            auth: None,
        }
    }

    pub fn location(&self) -> ReconcileResult<HookLocation> {
        HookLocation::parse(
            &self.flow,
            &self.timing,
            self.auth_method.as_deref().unwrap_or_default(),
        )
    }

    pub fn key(&self) -> HookKey {
        HookKey::new(self.url.clone(), Some(&self.method))
    }

    pub fn id(&self) -> ReconcileResult<HookId> {
        Ok(HookId::new(
            self.project_id.clone(),
            self.location()?,
            self.key(),
        ))
    }

    /// Reject declarations that can never be written.
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(ReconcileError::IncompleteKey {
                entity: "hook".to_string(),
                missing: "project_id".to_string(),
            });
        }
        if self.project_id.contains(':') {
            return Err(ReconcileError::invalid_value(
                "project_id",
                "must not contain ':'",
            ));
        }
        self.location()?;

        let url = url::Url::parse(&self.url)
            .map_err(|err| ReconcileError::invalid_value("url", format!("{}: {}", self.url, err)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ReconcileError::invalid_value(
                "url",
                format!("{}: scheme must be http or https", self.url),
            ));
        }
        if self.method.trim().is_empty() {
            return Err(ReconcileError::IncompleteKey {
                entity: format!("hook {}", self.url),
                missing: "method".to_string(),
            });
        }

        if self.response_ignore == Some(true) {
            if self.can_interrupt == Some(true) {
                return Err(ReconcileError::MutuallyExclusive {
                    first: "response_ignore".to_string(),
                    second: "can_interrupt".to_string(),
                    reason: "an ignored response cannot interrupt the flow".to_string(),
                });
            }
            if self.response_parse == Some(true) {
                return Err(ReconcileError::MutuallyExclusive {
                    first: "response_ignore".to_string(),
                    second: "response_parse".to_string(),
                    reason: "an ignored response cannot be parsed".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Stored form of this declaration.
    pub fn to_entry(&self) -> HookEntry {
        let response = if self.response_ignore.is_some() || self.response_parse.is_some() {
            Some(HookResponse {
                ignore: self.response_ignore,
                parse: self.response_parse,
            })
        } else {
            None
        };
        HookEntry {
            hook: WEB_HOOK.to_string(),
            config: WebHookConfig {
                url: self.url.clone(),
                method: self.method.clone(),
                body: self.body.as_deref().map(encode_body),
                response,
                can_interrupt: self.can_interrupt,
                auth: self.auth.clone(),
            },
        }
    }

    /// Rebuild a declaration from a stored entry, as import does.
    pub fn from_entry(id: &HookId, entry: &HookEntry) -> Self {
        let mut declaration = Self::new(id.project_id.clone(), id.location, entry.config.url.clone());
        declaration.method = entry.config.method.clone();
        declaration.body = entry.config.body.clone();
        if let Some(response) = &entry.config.response {
            declaration.response_ignore = response.ignore;
            declaration.response_parse = response.parse;
        }
        declaration.can_interrupt = entry.config.can_interrupt;
        declaration.auth = entry.config.auth.clone();
        declaration
    }
}
