//! Dispatcher configuration

use benchjudge_model::ProviderTag;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Tunables of a dispatch run.
///
/// Every field has a default, so an empty TOML table is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on a single judge call, in seconds
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Replaces the provider cool-down between windows when set
    #[serde(default)]
    pub cooldown_override_secs: Option<u64>,
}

fn default_job_timeout_secs() -> u64 {
    DEFAULT_JOB_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            cooldown_override_secs: None,
        }
    }
}

impl DispatchConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_cooldown_override(mut self, secs: u64) -> Self {
        self.cooldown_override_secs = Some(secs);
        self
    }

    /// Pause between windows for `model`.
    pub fn cooldown_for(&self, model: &str) -> Duration {
        match self.cooldown_override_secs {
            Some(secs) => Duration::from_secs(secs),
            None => ProviderTag::from_model(model).policy().cooldown_for(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.job_timeout(), Duration::from_secs(180));
        assert_eq!(config.max_tokens, 1500);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: DispatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DispatchConfig::default());
    }

    #[test]
    fn test_cooldown_override_wins() {
        let config = DispatchConfig::default();
        assert_eq!(config.cooldown_for("claude-3-opus"), Duration::from_secs(10));

        let config = config.with_cooldown_override(0);
        assert_eq!(config.cooldown_for("claude-3-opus"), Duration::ZERO);
    }
}
