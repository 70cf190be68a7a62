//! # benchjudge-model
//!
//! Judge model clients for benchjudge.
//!
//! ## Overview
//!
//! - [`OpenAICompatibleClient`] - HTTP client for chat-completions endpoints
//! - [`ProviderTag`] - Closed table mapping a model identifier to its provider
//! - [`MockChatClient`] - Scripted client for tests
//!
//! ## Providers
//!
//! | Prefix | Provider | Credential | Cool-down |
//! |--------|----------|------------|-----------|
//! | `gpt` | OpenAI | `OPENAI_API_KEY` | 0s |
//! | `gemini` | Gemini | `GEMINI_API_KEY` | 10s (25s for `gemini/gemini-1.5*`) |
//! | `claude` | Anthropic | `ANTHROPIC_API_KEY` | 10s |
//! | `command` | Cohere | `COHERE_API_KEY` | 5s |
//! | anything else | self-hosted | literal `EMPTY` | 0s |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use benchjudge_model::{ProviderTag, resolve_credential};
//!
//! let policy = ProviderTag::from_model("gpt-4o").policy();
//! let api_key = resolve_credential("gpt-4o");
//! assert_eq!(policy.credential_env, Some("OPENAI_API_KEY"));
//! ```

pub mod convert;
pub mod mock;
pub mod openai_compatible;
pub mod provider;

pub use mock::{MockChatClient, MockReply};
pub use openai_compatible::{
    OpenAICompatibleClient, OpenAICompatibleConfig, SESSION_ID_HEADER, TRACE_ID_HEADER,
};
pub use provider::{
    PLACEHOLDER_CREDENTIAL, ProviderPolicy, ProviderTag, resolve_credential, wire_model,
};
