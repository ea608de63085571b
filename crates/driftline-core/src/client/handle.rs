//! Caller-owned, reusable client handle.

use super::ClientConfig;

/// Clients that can be (re)built from connection settings.
pub trait FromClientConfig: Sized {
    fn from_client_config(config: &ClientConfig) -> anyhow::Result<Self>;
}

/// Holds one client and the settings it was built from.
///
/// The client is rebuilt only when [`ClientHandle::reconfigure`] receives
/// settings that differ structurally from the current ones.
#[derive(Debug)]
pub struct ClientHandle<A> {
    config: ClientConfig,
    api: A,
}

impl<A: FromClientConfig> ClientHandle<A> {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let api = A::from_client_config(&config)?;
        Ok(Self { config, api })
    }

    /// Swap in new settings; returns whether the client was rebuilt.
    pub fn reconfigure(&mut self, config: ClientConfig) -> anyhow::Result<bool> {
        if config == self.config {
            return Ok(false);
        }
        let api = A::from_client_config(&config)?;
        tracing::debug!(console_url = %config.console_url, "Rebuilt API client for new settings");
        self.api = api;
        self.config = config;
        Ok(true)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}
