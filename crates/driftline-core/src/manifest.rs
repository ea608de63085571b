//! `driftline.toml` declaration manifest.
//!
//! ```toml
//! [provider]
//! console_url = "https://api.console.ory.sh"
//! api_key_env = "DRIFTLINE_API_KEY"
//! timeout_secs = 30
//!
//! [projects.my-project]
//! cors_enabled = true
//! cors_origins = ["https://app.example.com"]
//!
//! [[hooks]]
//! project_id = "my-project"
//! flow = "registration"
//! timing = "after"
//! auth_method = "password"
//! url = "https://hooks.example.com/signup"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ClientConfig, DEFAULT_CONSOLE_URL, DEFAULT_TIMEOUT};
use crate::config::{DeclaredConfig, fields};
use crate::hooks::HookDeclaration;

pub const MANIFEST_FILE: &str = "driftline.toml";
pub const DEFAULT_API_KEY_ENV: &str = "DRIFTLINE_API_KEY";

/// Parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Declared configuration attributes, keyed by project id.
    #[serde(default)]
    pub projects: BTreeMap<String, toml::Table>,

    #[serde(default)]
    pub hooks: Vec<HookDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_console_url")]
    pub console_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            console_url: default_console_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_console_url() -> String {
    DEFAULT_CONSOLE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Manifest {
    /// Read and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Unknown attributes and malformed hooks are rejected up front, before
    /// any remote call is made.
    pub fn validate(&self) -> Result<()> {
        for (project_id, table) in &self.projects {
            let declared = table_to_declared(table);
            declared
                .tracked_fields()
                .validate()
                .with_context(|| format!("Invalid configuration for project '{}'", project_id))?;
        }
        for (index, hook) in self.hooks.iter().enumerate() {
            hook.validate()
                .with_context(|| format!("Invalid hook #{} ({})", index + 1, hook.url))?;
        }
        if self.provider.timeout_secs == 0 {
            anyhow::bail!("provider.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Declared configuration per project, in project id order.
    pub fn declared_configs(&self) -> impl Iterator<Item = (&str, DeclaredConfig)> {
        self.projects
            .iter()
            .map(|(id, table)| (id.as_str(), table_to_declared(table)))
    }

    pub fn declared_config(&self, project_id: &str) -> Option<DeclaredConfig> {
        self.projects.get(project_id).map(table_to_declared)
    }

    /// Connection settings, with the API key read from the process
    /// environment.
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_with(|name| std::env::var(name).ok())
    }

    pub fn client_config_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.provider.console_url)?
            .with_timeout(Duration::from_secs(self.provider.timeout_secs));
        match lookup(&self.provider.api_key_env).filter(|key| !key.is_empty()) {
            Some(key) => config = config.with_api_key(key),
            None => tracing::warn!(
                env = %self.provider.api_key_env,
                "No API key in environment, requests will be unauthenticated"
            ),
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize manifest to TOML")
    }
}

/// `--manifest` if given, else `./driftline.toml` when present, else the
/// user-level manifest.
pub fn resolve_manifest_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let local = std::env::current_dir()
        .context("Failed to determine current directory")?
        .join(MANIFEST_FILE);
    if local.exists() {
        return Ok(local);
    }
    global_manifest_path()
}

pub fn global_manifest_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("driftline")
        .join(MANIFEST_FILE))
}

fn table_to_declared(table: &toml::Table) -> DeclaredConfig {
    table
        .iter()
        .map(|(name, value)| (name.clone(), toml_to_json(value)))
        .collect()
}

fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Attach the offending lines to a TOML syntax error.
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();
    let line = error
        .span()
        .map(|span| content[..span.start.min(content.len())].lines().count().max(1));

    match line {
        Some(line_num) => anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            line_context(content, line_num),
            message
        ),
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
