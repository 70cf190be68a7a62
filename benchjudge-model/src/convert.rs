//! Wire types for the OpenAI chat-completions format.
//!
//! Every supported provider exposes (or is fronted by) this format, so one set
//! of request and response shapes covers all of them.

use crate::provider::wire_model;
use benchjudge_core::{ChatMessage, ChatRequest, ChatResponse, SafetySetting, TokenUsage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: Option<Message>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

pub fn message_to_wire(message: &ChatMessage) -> Message {
    Message { role: message.role.as_str().to_string(), content: Some(message.content.clone()) }
}

pub fn build_request(request: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: wire_model(&request.model).to_string(),
        messages: request.messages.iter().map(message_to_wire).collect(),
        temperature: request.params.temperature,
        max_tokens: request.params.max_tokens,
        safety_settings: request.params.safety_settings.clone(),
    }
}

/// Convert the first choice into a [`ChatResponse`]. A missing choice or
/// missing content yields an empty answer, which the scorer maps to point 0.
pub fn from_response(response: ChatCompletionResponse) -> ChatResponse {
    let choice = response.choices.into_iter().next();
    let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
    let answer = choice.and_then(|c| c.message).and_then(|m| m.content).unwrap_or_default();

    ChatResponse {
        answer,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        finish_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchjudge_core::SamplingParams;

    #[test]
    fn test_build_request_strips_routing_prefix() {
        let req = ChatRequest::new("gemini/gemini-1.5-pro", vec![ChatMessage::user("hi")]);
        let wire = build_request(&req);
        assert_eq!(wire.model, "gemini-1.5-pro");
        assert_eq!(wire.messages[0].role, "user");
    }

    #[test]
    fn test_build_request_carries_sampling_params() {
        let req = ChatRequest::new("gpt-4o", vec![]).with_params(SamplingParams {
            temperature: Some(0.0),
            max_tokens: Some(1500),
            safety_settings: None,
        });
        let json = serde_json::to_value(build_request(&req)).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 1500);
        assert!(json.get("safety_settings").is_none());
    }

    #[test]
    fn test_from_response_reads_first_choice() {
        let raw = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "[[8]]"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        });
        let response: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let converted = from_response(response);
        assert_eq!(converted.answer, "[[8]]");
        assert_eq!(converted.finish_reason.as_deref(), Some("stop"));
        assert_eq!(converted.usage.unwrap().total_tokens, 13);
    }

    #[test]
    fn test_from_response_without_choices() {
        let response: ChatCompletionResponse =
            serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        let converted = from_response(response);
        assert_eq!(converted.answer, "");
        assert!(converted.finish_reason.is_none());
        assert!(converted.usage.is_none());
    }
}
