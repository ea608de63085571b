//! Remote document client.
//!
//! The engine only needs two primitives from the platform: fetch the whole
//! project document and apply a JSON Patch batch to it. [`ProjectApi`] is
//! that seam; [`http::HttpProjectApi`] is the production implementation.

pub mod handle;
pub mod http;

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::patch::JsonPatchOp;

pub use handle::{ClientHandle, FromClientConfig};
pub use http::HttpProjectApi;

pub const DEFAULT_CONSOLE_URL: &str = "https://api.console.ory.sh";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch and patch primitives against the platform API.
pub trait ProjectApi {
    /// Whole configuration document; `Ok(None)` when the project is not
    /// visible (yet).
    fn fetch_config(&self, project_id: &str) -> anyhow::Result<Option<Value>>;

    /// Apply `ops` atomically and return the document the API reports back.
    fn patch_config(&self, project_id: &str, ops: &[JsonPatchOp]) -> anyhow::Result<Value>;
}

impl<T: ProjectApi + ?Sized> ProjectApi for &T {
    fn fetch_config(&self, project_id: &str) -> anyhow::Result<Option<Value>> {
        (**self).fetch_config(project_id)
    }

    fn patch_config(&self, project_id: &str, ops: &[JsonPatchOp]) -> anyhow::Result<Value> {
        (**self).patch_config(project_id, ops)
    }
}

/// Connection settings. Handles compare these structurally to decide
/// whether a cached client is still valid.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub console_url: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(console_url: &str) -> anyhow::Result<Self> {
        let console_url = Url::parse(console_url)
            .map_err(|err| anyhow::anyhow!("Invalid console URL '{}': {}", console_url, err))?;
        if console_url.cannot_be_a_base() {
            anyhow::bail!("Console URL cannot be used as a base: {}", console_url);
        }
        Ok(Self {
            console_url,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<console_url>/projects/<project_id>`, with the id escaped.
    pub fn project_url(&self, project_id: &str) -> anyhow::Result<Url> {
        let mut url = self.console_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Console URL cannot be used as a base: {}", self.console_url))?
            .pop_if_empty()
            .push("projects")
            .push(project_id);
        Ok(url)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("console_url", &self.console_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_url_appends_escaped_segments() {
        let config = ClientConfig::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            config.project_url("a b").unwrap().as_str(),
            "https://api.example.com/v1/projects/a%20b"
        );
        let config = ClientConfig::new(DEFAULT_CONSOLE_URL).unwrap();
        assert_eq!(
            config.project_url("proj-1").unwrap().as_str(),
            "https://api.console.ory.sh/projects/proj-1"
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ClientConfig::new(DEFAULT_CONSOLE_URL)
            .unwrap()
            .with_api_key("ory_pat_secret");
        assert!(!format!("{:?}", config).contains("ory_pat_secret"));
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(ClientConfig::new("mailto:ops@example.com").is_err());
        assert!(ClientConfig::new("not a url").is_err());
    }
}
