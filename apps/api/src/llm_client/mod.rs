/// LLM Client: the single point of entry for all language-model calls.
///
/// ARCHITECTURAL RULE: services never talk HTTP to the model provider directly.
/// They depend on the `ChatModel` trait; `LlmClient` is the production
/// implementation over an OpenAI-compatible chat-completions endpoint.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Structured-output constraint passed through to the provider.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonSchema { json_schema: JsonSchemaSpec },
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaSpec {
    pub name: String,
    pub strict: bool,
    pub schema: Value,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a ResponseFormat>,
}

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}

/// `content` is kept as raw JSON: providers may answer with a string, an
/// array of parts, or null.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    /// Content of the first choice, only when it is a plain string.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .and_then(Value::as_str)
    }

    #[cfg(test)]
    pub fn with_content(content: Value) -> Self {
        Self {
            choices: vec![Choice {
                message: AssistantMessage {
                    content: Some(content),
                },
            }],
            usage: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// ChatModel seam
// ────────────────────────────────────────────────────────────────────────────

/// `invoke(messages, response_format) -> response`. Carried in `AppState` as
/// `Arc<dyn ChatModel>` so tests can script answers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(
        &self,
        messages: &[ChatMessage],
        response_format: Option<&ResponseFormat>,
    ) -> Result<LlmResponse, LlmError>;
}

/// HTTP client for an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_attempts: u32,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        max_attempts: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), COMPLETIONS_PATH),
            model,
            max_attempts: max_attempts.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a raw call, returning the full response object.
    /// 429 and 5xx answers are retried with exponential backoff while attempts remain.
    pub async fn call(
        &self,
        messages: &[ChatMessage],
        response_format: Option<&ResponseFormat>,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = CompletionRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages,
            response_format,
        };

        let mut attempt = 1;
        loop {
            let error = match self.send_once(&request_body).await {
                Ok(response) => return Ok(response),
                Err(Attempt::Final(e)) => return Err(e),
                Err(Attempt::Retryable(e)) => e,
            };

            if attempt >= self.max_attempts {
                return Err(error);
            }

            // Exponential backoff: 1s, 2s, 4s
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
            warn!(
                "LLM call attempt {} failed ({error}), retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(&self, request_body: &CompletionRequest<'_>) -> Result<LlmResponse, Attempt> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request_body)
            .send()
            .await
            .map_err(|e| Attempt::Retryable(LlmError::Http(e)))?;

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            return Err(Attempt::Retryable(LlmError::Api {
                status: status.as_u16(),
                message: body,
            }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(Attempt::Final(LlmError::Api {
                status: status.as_u16(),
                message,
            }));
        }

        let llm_response: LlmResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Final(LlmError::Http(e)))?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(llm_response)
    }
}

/// Outcome of one failed HTTP exchange.
enum Attempt {
    /// Transport failure, 429 or 5xx: worth another attempt.
    Retryable(LlmError),
    Final(LlmError),
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn invoke(
        &self,
        messages: &[ChatMessage],
        response_format: Option<&ResponseFormat>,
    ) -> Result<LlmResponse, LlmError> {
        self.call(messages, response_format).await
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_text_requires_string_content() {
        let parts = LlmResponse::with_content(json!([{"type": "text", "text": "hi"}]));
        assert!(parts.text().is_none());

        let plain = LlmResponse::with_content(json!("hi"));
        assert_eq!(plain.text(), Some("hi"));
    }

    #[test]
    fn test_response_deserializes_null_content() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": null}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 0, "total_tokens": 3}
        });
        let response: LlmResponse = serde_json::from_value(body).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_response_format_serializes_json_schema_shape() {
        let format = ResponseFormat::JsonSchema {
            json_schema: JsonSchemaSpec {
                name: "demo".to_string(),
                strict: true,
                schema: json!({"type": "object"}),
            },
        };
        let value = serde_json::to_value(&format).unwrap();
        assert_eq!(value["type"], "json_schema");
        assert_eq!(value["json_schema"]["name"], "demo");
        assert_eq!(value["json_schema"]["strict"], true);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client =
            LlmClient::new("k".to_string(), "http://localhost:9000/", "m".to_string(), 0).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9000/v1/chat/completions");
        assert_eq!(client.max_attempts, 1);
        assert_eq!(client.model(), "m");
    }

    #[tokio::test]
    async fn test_exhausted_attempts_return_last_transport_error() {
        let client =
            LlmClient::new("k".to_string(), "http://127.0.0.1:1", "m".to_string(), 2).unwrap();
        let result = client.call(&[ChatMessage::user("hi")], None).await;
        assert!(matches!(result, Err(LlmError::Http(_))), "got {result:?}");
    }
}
