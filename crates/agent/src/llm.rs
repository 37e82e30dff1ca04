//! Chat-completion endpoint client.
//!
//! The runtime only depends on the [`ChatClient`] trait, so tests drive the
//! loop with scripted turns and production wires in [`OpenAiChatClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use leadmate_core::LlmConfig;

use crate::wire::{ChatMessage, ToolCall, ToolDefinition};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("chat endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat endpoint returned HTTP {status}: {message}")]
    Endpoint { status: u16, message: String },
    #[error("chat endpoint response was unusable: {0}")]
    InvalidResponse(String),
    #[error("no API key is configured for the chat endpoint")]
    MissingApiKey,
}

/// What the model answered for one request: optional text plus zero or
/// more tool calls, in the order the endpoint listed them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssistantTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantTurn, LlmError>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug)]
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantTurn, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: if tools.is_empty() { None } else { Some(tools.to_vec()) },
            tool_choice: if tools.is_empty() { None } else { Some(json!("auto")) },
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Endpoint {
                status: status.as_u16(),
                message: endpoint_error_message(&body),
            });
        }

        let body: ChatResponse = response.json().await?;
        assistant_turn(body)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct EndpointErrorBody {
    error: EndpointErrorDetail,
}

#[derive(Debug, Deserialize)]
struct EndpointErrorDetail {
    message: String,
}

fn assistant_turn(response: ChatResponse) -> Result<AssistantTurn, LlmError> {
    if let Some(usage) = &response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "chat endpoint usage"
        );
    }

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

    Ok(AssistantTurn {
        content: choice.message.content,
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
    })
}

/// Prefers the structured `{"error": {"message": ...}}` body OpenAI-style
/// endpoints send; anything else is reported as a trimmed snippet.
fn endpoint_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<EndpointErrorBody>(body) {
        return parsed.error.message;
    }

    let snippet: String = body.chars().take(200).collect();
    let snippet = snippet.trim();
    if snippet.is_empty() {
        "empty error body".to_string()
    } else {
        snippet.to_string()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use leadmate_core::LlmConfig;

    use super::{assistant_turn, endpoint_error_message, ChatResponse, LlmError, OpenAiChatClient};

    fn config_with_key() -> LlmConfig {
        LlmConfig {
            base_url: "https://llm.internal/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: Some(SecretString::from("sk-test".to_string())),
            timeout_secs: 5,
        }
    }

    fn decode(body: serde_json::Value) -> ChatResponse {
        serde_json::from_value(body).expect("response body should decode")
    }

    #[test]
    fn text_only_response_becomes_a_turn_without_calls() {
        let turn = assistant_turn(decode(json!({
            "choices": [{"message": {"content": "All set."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        })))
        .expect("turn should parse");

        assert_eq!(turn.content.as_deref(), Some("All set."));
        assert!(turn.tool_calls.is_empty());
    }

    #[test]
    fn tool_call_response_keeps_raw_argument_text() {
        let turn = assistant_turn(decode(json!({
            "choices": [{"message": {
                "content": null,
                "tool_calls": [{
                    "id": "call-1",
                    "type": "function",
                    "function": {
                        "name": "add_lead_note",
                        "arguments": "{\"lead_id\":\"acme\",\"text\":\"hi\"}"
                    }
                }]
            }}]
        })))
        .expect("turn should parse");

        assert_eq!(turn.content, None);
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].function.arguments, "{\"lead_id\":\"acme\",\"text\":\"hi\"}");
    }

    #[test]
    fn empty_choice_list_is_an_invalid_response() {
        let err = assistant_turn(decode(json!({"choices": []}))).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn endpoint_errors_prefer_the_structured_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "auth"}}"#;
        assert_eq!(endpoint_error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn endpoint_errors_fall_back_to_a_body_snippet() {
        assert_eq!(endpoint_error_message("  <html>502</html>  "), "<html>502</html>");
        assert_eq!(endpoint_error_message(""), "empty error body");
    }

    #[test]
    fn client_requires_an_api_key() {
        let config = LlmConfig { api_key: None, ..config_with_key() };
        let err = OpenAiChatClient::new(&config).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[test]
    fn client_trims_the_trailing_slash_off_the_base_url() {
        let client = OpenAiChatClient::new(&config_with_key()).expect("client should build");
        assert_eq!(client.base_url, "https://llm.internal/v1");
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}
