//! Closed lookup table of judge providers.
//!
//! A model identifier picks its provider by prefix. The provider decides which
//! credential is sent, where requests go by default and how long the
//! dispatcher pauses between windows.

use benchjudge_core::SafetySetting;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Credential sent to servers that do not check one (vLLM and friends).
pub const PLACEHOLDER_CREDENTIAL: &str = "EMPTY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTag {
    OpenAi,
    Gemini,
    Anthropic,
    Cohere,
    SelfHosted,
}

/// Static policy for one provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderPolicy {
    pub tag: ProviderTag,
    /// Model identifiers starting with this prefix belong to the provider.
    pub model_prefix: Option<&'static str>,
    /// Environment variable holding the API key.
    pub credential_env: Option<&'static str>,
    pub default_base_url: &'static str,
    /// Pause applied after every window of judge calls.
    pub cooldown: Duration,
    /// Longer pause for a model family with a tighter rate limit.
    pub extended_cooldown: Option<(&'static str, Duration)>,
    /// Whether requests carry relaxed safety thresholds.
    pub relaxed_safety: bool,
}

const PROVIDERS: [ProviderPolicy; 5] = [
    ProviderPolicy {
        tag: ProviderTag::OpenAi,
        model_prefix: Some("gpt"),
        credential_env: Some("OPENAI_API_KEY"),
        default_base_url: "https://api.openai.com/v1",
        cooldown: Duration::ZERO,
        extended_cooldown: None,
        relaxed_safety: false,
    },
    ProviderPolicy {
        tag: ProviderTag::Gemini,
        model_prefix: Some("gemini"),
        credential_env: Some("GEMINI_API_KEY"),
        default_base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
        cooldown: Duration::from_secs(10),
        extended_cooldown: Some(("gemini/gemini-1.5", Duration::from_secs(25))),
        relaxed_safety: true,
    },
    ProviderPolicy {
        tag: ProviderTag::Anthropic,
        model_prefix: Some("claude"),
        credential_env: Some("ANTHROPIC_API_KEY"),
        default_base_url: "https://api.anthropic.com/v1",
        cooldown: Duration::from_secs(10),
        extended_cooldown: None,
        relaxed_safety: false,
    },
    ProviderPolicy {
        tag: ProviderTag::Cohere,
        model_prefix: Some("command"),
        credential_env: Some("COHERE_API_KEY"),
        default_base_url: "https://api.cohere.ai/compatibility/v1",
        cooldown: Duration::from_secs(5),
        extended_cooldown: None,
        relaxed_safety: false,
    },
    ProviderPolicy {
        tag: ProviderTag::SelfHosted,
        model_prefix: None,
        credential_env: None,
        default_base_url: "http://localhost:8000/v1",
        cooldown: Duration::ZERO,
        extended_cooldown: None,
        relaxed_safety: false,
    },
];

impl ProviderTag {
    pub fn all() -> [ProviderTag; 5] {
        PROVIDERS.map(|p| p.tag)
    }

    /// Resolve the provider for a model identifier by prefix.
    pub fn from_model(model: &str) -> Self {
        PROVIDERS
            .iter()
            .find(|p| p.model_prefix.is_some_and(|prefix| model.starts_with(prefix)))
            .map(|p| p.tag)
            .unwrap_or(ProviderTag::SelfHosted)
    }

    pub fn policy(self) -> &'static ProviderPolicy {
        // Table rows follow the enum's declaration order.
        &PROVIDERS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderTag::OpenAi => "openai",
            ProviderTag::Gemini => "gemini",
            ProviderTag::Anthropic => "anthropic",
            ProviderTag::Cohere => "cohere",
            ProviderTag::SelfHosted => "self_hosted",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderPolicy {
    /// Cool-down for a specific model of this provider.
    pub fn cooldown_for(&self, model: &str) -> Duration {
        match self.extended_cooldown {
            Some((prefix, extended)) if model.starts_with(prefix) => extended,
            _ => self.cooldown,
        }
    }

    /// Look up the credential through `lookup` (normally `std::env::var`).
    ///
    /// An unset variable yields `None`; it is not an error here, the provider
    /// rejects the call later if it needs a key.
    pub fn credential_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self.credential_env {
            Some(var) => lookup(var),
            None => Some(PLACEHOLDER_CREDENTIAL.to_string()),
        }
    }

    pub fn safety_settings(&self) -> Option<Vec<SafetySetting>> {
        self.relaxed_safety.then(relaxed_safety_settings)
    }
}

/// Credential for `model`, read from the process environment.
pub fn resolve_credential(model: &str) -> Option<String> {
    ProviderTag::from_model(model).policy().credential_with(|var| std::env::var(var).ok())
}

/// Model name as sent on the wire: a leading `<provider>/` routing segment is dropped.
pub fn wire_model(model: &str) -> &str {
    match model.split_once('/') {
        Some((prefix, rest))
            if !rest.is_empty()
                && ProviderTag::all().iter().any(|tag| tag.policy().model_prefix == Some(prefix)) =>
        {
            rest
        }
        _ => model,
    }
}

fn relaxed_safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting::new(category, "BLOCK_NONE"))
    .collect()
}
