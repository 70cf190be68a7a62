use anyhow::{Context, Result};
use benchjudge_dispatch::DispatchConfig;
use benchjudge_model::OpenAICompatibleConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Settings read from the `--config` TOML file.
///
/// ```toml
/// [dispatch]
/// job_timeout_secs = 120
/// cooldown_override_secs = 0
///
/// [client]
/// base_url = "http://localhost:8000/v1"
/// request_timeout_secs = 200
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub client: ClientSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientSettings {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn client_config(&self) -> OpenAICompatibleConfig {
        let mut config = OpenAICompatibleConfig::default();
        if let Some(base_url) = &self.client.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(secs) = self.client.request_timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        config
    }
}
