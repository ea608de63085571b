//! Blocking HTTP implementation of [`ProjectApi`].

use anyhow::Context;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

use super::{ClientConfig, FromClientConfig, ProjectApi};
use crate::patch::JsonPatchOp;

const USER_AGENT: &str = concat!("driftline/", env!("CARGO_PKG_VERSION"));

/// Project API over the console endpoint.
#[derive(Debug, Clone)]
pub struct HttpProjectApi {
    config: ClientConfig,
    http: Client,
}

impl HttpProjectApi {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

impl FromClientConfig for HttpProjectApi {
    fn from_client_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Self::new(config.clone())
    }
}

impl ProjectApi for HttpProjectApi {
    fn fetch_config(&self, project_id: &str) -> anyhow::Result<Option<Value>> {
        let url = self.config.project_url(project_id)?;
        let response = self
            .authorize(self.http.get(url.clone()))
            .send()
            .with_context(|| format!("Failed to fetch project {} from {}", project_id, url))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!(
                "Failed to fetch project {}: HTTP {} from {}: {}",
                project_id,
                status,
                url,
                body
            );
        }

        let document: Value = response
            .json()
            .context("Failed to parse project response")?;
        Ok(Some(document))
    }

    fn patch_config(&self, project_id: &str, ops: &[JsonPatchOp]) -> anyhow::Result<Value> {
        let url = self.config.project_url(project_id)?;
        let response = self
            .authorize(self.http.patch(url.clone()))
            .json(ops)
            .send()
            .with_context(|| format!("Failed to patch project {} at {}", project_id, url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!(
                "Failed to patch project {}: HTTP {} from {}: {}",
                project_id,
                status,
                url,
                body
            );
        }

        let body: Value = response
            .json()
            .context("Failed to parse project update response")?;
        Ok(unwrap_update(project_id, body))
    }
}

/// The update endpoint wraps the project as `{project, warnings}`.
fn unwrap_update(project_id: &str, mut body: Value) -> Value {
    if let Some(warnings) = body.get("warnings").and_then(Value::as_array) {
        for warning in warnings {
            tracing::warn!(project_id, warning = %warning, "Project update warning");
        }
    }
    match body.get_mut("project").map(Value::take) {
        Some(project) if !project.is_null() => project,
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_project_from_update_response() {
        let body = json!({
            "project": {"id": "proj-1", "cors_public": {"enabled": true}},
            "warnings": [{"message": "deprecated key"}]
        });
        assert_eq!(
            unwrap_update("proj-1", body),
            json!({"id": "proj-1", "cors_public": {"enabled": true}})
        );
    }

    #[test]
    fn passes_through_bare_project() {
        let body = json!({"id": "proj-1"});
        assert_eq!(unwrap_update("proj-1", body.clone()), body);
    }

    #[test]
    fn builds_from_config() {
        let config = ClientConfig::new("https://api.example.com").unwrap();
        let api = HttpProjectApi::from_client_config(&config).unwrap();
        assert_eq!(api.config(), &config);
    }
}
