use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use super::base::{CompletionRequest, Provider, Usage};
use super::configs::AnthropicProviderConfig;
use super::errors::ProviderError;
use crate::models::content::ContentBlock;
use crate::models::message::Message;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Block types we understand in a response; anything else is skipped
const KNOWN_BLOCK_TYPES: &[&str] = &["text", "tool_use"];

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ProviderError::Client(err.to_string()))?;

        Ok(Self { client, config })
    }

    fn create_payload(request: &CompletionRequest<'_>) -> Value {
        let mut payload = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": request.messages,
        });

        if let Some(system) = request.system.filter(|s| !s.is_empty()) {
            payload["system"] = json!(system);
        }
        if !request.tools.is_empty() {
            payload["tools"] = json!(request.tools);
        }

        payload
    }

    fn get_usage(data: &Value) -> Usage {
        let tokens = |key: &str| {
            data.pointer(&format!("/usage/{key}"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };
        Usage::new(tokens("input_tokens"), tokens("output_tokens"))
    }

    fn response_to_message(response: &Value) -> Result<Message, ProviderError> {
        let blocks = response
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::InvalidResponse("missing content array".to_string()))?;

        let mut message = Message::assistant();
        for block in blocks {
            let block_type = block.get("type").and_then(Value::as_str).unwrap_or_default();
            if !KNOWN_BLOCK_TYPES.contains(&block_type) {
                debug!(block_type, "skipping unsupported content block");
                continue;
            }

            let content: ContentBlock = serde_json::from_value(block.clone()).map_err(|err| {
                ProviderError::InvalidResponse(format!("malformed {block_type} block: {err}"))
            })?;
            message = message.with_content(content);
        }

        Ok(message)
    }

    async fn post(&self, payload: Value) -> Result<Value, ProviderError> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = error_message(&response.text().await.unwrap_or_default());
        Err(match status {
            StatusCode::UNAUTHORIZED => ProviderError::Authentication(message),
            StatusCode::FORBIDDEN => ProviderError::Forbidden(message),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
            _ => ProviderError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<(Message, Usage), ProviderError> {
        debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending request to Anthropic"
        );

        let payload = Self::create_payload(&request);
        let response = self.post(payload).await?;

        let message = Self::response_to_message(&response)?;
        let usage = Self::get_usage(&response);
        let stop_reason = response.get("stop_reason").and_then(Value::as_str);
        debug!(
            stop_reason,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "received response"
        );

        Ok((message, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::Tool;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "claude-sonnet-4-5-20250929";

    async fn setup_mock_server(status: u16, response_body: Value) -> (MockServer, AnthropicProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test_api_key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(status).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let config = AnthropicProviderConfig::new(mock_server.uri(), "test_api_key");
        let provider = AnthropicProvider::new(config).unwrap();
        (mock_server, provider)
    }

    fn request<'a>(messages: &'a [Message], tools: &'a [Tool]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: MODEL,
            max_tokens: 1024,
            system: Some("You are helpful."),
            messages,
            tools,
        }
    }

    #[tokio::test]
    async fn test_complete_basic() -> anyhow::Result<()> {
        let response_body = json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{
                "type": "text",
                "text": "Hello! How can I assist you today?"
            }],
            "model": MODEL,
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {
                "input_tokens": 12,
                "output_tokens": 15
            }
        });

        let (_server, provider) = setup_mock_server(200, response_body).await;
        let messages = vec![Message::user().with_text("Hello?")];

        let (message, usage) = provider.complete(request(&messages, &[])).await?;

        assert_eq!(message.text(), "Hello! How can I assist you today?");
        assert!(!message.has_tool_use());
        assert_eq!(usage.input_tokens, Some(12));
        assert_eq!(usage.output_tokens, Some(15));
        assert_eq!(usage.total_tokens, Some(27));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_tool_use() -> anyhow::Result<()> {
        let response_body = json!({
            "id": "msg_456",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "abc"},
                {"type": "text", "text": "Let me look."},
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "read_file",
                    "input": {"path": "README.md"}
                }
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 30, "output_tokens": 10}
        });

        let (_server, provider) = setup_mock_server(200, response_body).await;
        let messages = vec![Message::user().with_text("What's in the README?")];

        let (message, _) = provider.complete(request(&messages, &[])).await?;

        assert_eq!(message.content.len(), 2);
        let tool_use = message.tool_uses().next().unwrap();
        assert_eq!(tool_use.id, "toolu_01");
        assert_eq!(tool_use.name, "read_file");
        assert_eq!(tool_use.input, json!({"path": "README.md"}));
        Ok(())
    }

    #[tokio::test]
    async fn test_request_payload() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(json!({
                "model": MODEL,
                "max_tokens": 1024,
                "system": "You are helpful.",
                "tools": [{
                    "name": "read_file",
                    "description": "Read a file",
                    "input_schema": {"type": "object", "properties": {}, "required": []}
                }],
                "messages": [
                    {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                    {"role": "assistant", "content": [
                        {"type": "tool_use", "id": "t1", "name": "read_file", "input": {}}
                    ]},
                    {"role": "user", "content": [
                        {"type": "tool_result", "tool_use_id": "t1", "is_error": true, "content": "Error: nope"}
                    ]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "done"}],
                "usage": {"input_tokens": 1, "output_tokens": 1}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            AnthropicProvider::new(AnthropicProviderConfig::new(mock_server.uri(), "key"))?;
        let tools = vec![Tool::new(
            "read_file",
            "Read a file",
            json!({"type": "object", "properties": {}, "required": []}),
        )];
        let messages = vec![
            Message::user().with_text("hi"),
            Message::assistant().with_tool_use("t1", "read_file", json!({})),
            Message::user().with_tool_result("t1", "Error: nope", true),
        ];

        let (message, _) = provider.complete(request(&messages, &tools)).await?;
        assert_eq!(message.text(), "done");
        Ok(())
    }

    #[test]
    fn test_payload_omits_empty_system_and_tools() {
        let messages = vec![Message::user().with_text("hi")];
        let payload = AnthropicProvider::create_payload(&CompletionRequest {
            model: MODEL,
            max_tokens: 10,
            system: Some(""),
            messages: &messages,
            tools: &[],
        });

        assert!(payload.get("system").is_none());
        assert!(payload.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let body = |message: &str| {
            json!({"type": "error", "error": {"type": "some_error", "message": message}})
        };
        let messages = vec![Message::user().with_text("hi")];

        let (_server, provider) = setup_mock_server(401, body("invalid x-api-key")).await;
        let err = provider.complete(request(&messages, &[])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(ref m) if m == "invalid x-api-key"));

        let (_server, provider) = setup_mock_server(403, body("forbidden")).await;
        let err = provider.complete(request(&messages, &[])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Forbidden(_)));

        let (_server, provider) = setup_mock_server(429, body("rate limited")).await;
        let err = provider.complete(request(&messages, &[])).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)));

        let (_server, provider) = setup_mock_server(529, body("Overloaded")).await;
        let err = provider.complete(request(&messages, &[])).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Api { status: 529, ref message } if message == "Overloaded"
        ));
    }

    #[tokio::test]
    async fn test_invalid_response() {
        let (_server, provider) = setup_mock_server(200, json!({"id": "msg"})).await;
        let messages = vec![Message::user().with_text("hi")];
        let err = provider.complete(request(&messages, &[])).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on the discard port
        let provider =
            AnthropicProvider::new(AnthropicProviderConfig::new("http://127.0.0.1:9", "key"))
                .unwrap();
        let messages = vec![Message::user().with_text("hi")];
        let err = provider.complete(request(&messages, &[])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message("  upstream connect error  "), "upstream connect error");
        assert_eq!(
            error_message(r#"{"error": {"message": "bad request"}}"#),
            "bad request"
        );
    }
}
