//! HTTP judge client for OpenAI-compatible chat-completions endpoints.

use crate::convert::{self, ChatCompletionResponse};
use crate::provider::ProviderTag;
use async_trait::async_trait;
use benchjudge_core::{BenchError, ChatClient, ChatRequest, ChatResponse, Result};
use reqwest::Client;
use std::time::Duration;

pub const SESSION_ID_HEADER: &str = "x-session-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Client configuration.
///
/// `base_url` replaces the provider default for every request that does not
/// carry its own host.
#[derive(Debug, Clone, Default)]
pub struct OpenAICompatibleConfig {
    pub base_url: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl OpenAICompatibleConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// One client serves every provider; the model identifier on each request
/// picks the endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use benchjudge_model::{OpenAICompatibleClient, OpenAICompatibleConfig};
///
/// let client = OpenAICompatibleClient::new(OpenAICompatibleConfig::default())?;
/// let response = client.chat(request).await?;
/// ```
pub struct OpenAICompatibleClient {
    client: Client,
    config: OpenAICompatibleConfig,
}

impl OpenAICompatibleClient {
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BenchError::Model(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, request: &ChatRequest) -> String {
        let base = request
            .host
            .as_deref()
            .or(self.config.base_url.as_deref())
            .unwrap_or_else(|| ProviderTag::from_model(&request.model).policy().default_base_url);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for OpenAICompatibleClient {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let api_url = self.api_url(&request);
        let body = convert::build_request(&request);

        tracing::debug!(
            url = %api_url,
            model = %body.model,
            trace_id = %request.metadata.trace_id,
            "sending judge request"
        );

        let mut builder = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header(SESSION_ID_HEADER, &request.metadata.session_id)
            .header(TRACE_ID_HEADER, &request.metadata.trace_id)
            .json(&body);
        if let Some(api_key) = &request.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BenchError::Model(format!("Judge API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BenchError::Model(format!("Judge API error ({}): {}", status, error_text)));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BenchError::Model(format!("Failed to parse judge response: {}", e)))?;

        Ok(convert::from_response(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_prefers_request_host() {
        let client = OpenAICompatibleClient::new(
            OpenAICompatibleConfig::default().with_base_url("http://configured/v1"),
        )
        .unwrap();
        let req = ChatRequest::new("gpt-4o", vec![]).with_host(Some("http://override/v1/".into()));
        assert_eq!(client.api_url(&req), "http://override/v1/chat/completions");
    }

    #[test]
    fn test_api_url_falls_back_to_provider_default() {
        let client = OpenAICompatibleClient::new(OpenAICompatibleConfig::default()).unwrap();
        let req = ChatRequest::new("my-local-model", vec![]);
        assert_eq!(client.api_url(&req), "http://localhost:8000/v1/chat/completions");
    }
}
