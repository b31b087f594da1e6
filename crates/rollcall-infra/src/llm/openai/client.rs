//! OpenAiProvider -- concrete [`CompletionProvider`] implementation for the
//! OpenAI Chat Completions API.
//!
//! Sends non-streaming requests to `{base_url}/chat/completions` with
//! bearer authentication and maps HTTP failures onto the completion error
//! taxonomy so the retry layer can classify them.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use rollcall_core::llm::provider::CompletionProvider;
use rollcall_types::llm::{CompletionError, CompletionRequest, CompletionResponse};

use super::types::{OpenAiErrorResponse, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiResponseMessage};

/// Reply recorded when the model answers with tool calls instead of text.
pub const TOOL_CALL_PLACEHOLDER: &str = "[tool call reply not handled]";

/// OpenAI completion provider.
///
/// Implements [`CompletionProvider`] for the Chat Completions API.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing the authorization header. It never appears in Debug
/// output, Display output, or tracing logs.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key wrapped in SecretString
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(api_key: SecretString, base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`OpenAiRequest`].
    fn to_openai_request(request: &CompletionRequest) -> OpenAiRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        OpenAiRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

/// Extract the reply text from the assistant message.
///
/// A null `content` alongside tool calls becomes the fixed placeholder;
/// a null `content` without them becomes the empty string.
fn reply_text(message: OpenAiResponseMessage) -> String {
    match message.content {
        Some(text) => text,
        None if message
            .tool_calls
            .as_ref()
            .is_some_and(|calls| !calls.is_empty()) =>
        {
            TOOL_CALL_PLACEHOLDER.to_string()
        }
        None => String::new(),
    }
}

/// Pull the human-readable message out of an API error body, falling back
/// to the raw body when it is not the standard envelope.
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAiErrorResponse>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// OpenAiProvider intentionally does NOT derive Debug to prevent
// accidental exposure of internal state. The SecretString field ensures
// the API key is never printed, but we also omit Debug entirely.

impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let body = Self::to_openai_request(request);
        let url = self.url("/chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => CompletionError::AuthenticationFailed,
                429 => CompletionError::RateLimited {
                    retry_after_ms: None,
                },
                400 => CompletionError::InvalidRequest(parse_error_message(&error_body)),
                s if s >= 500 => CompletionError::Overloaded(parse_error_message(&error_body)),
                _ => CompletionError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let openai_resp: OpenAiResponse = response.json().await.map_err(|e| {
            CompletionError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let choice = openai_resp.choices.into_iter().next().ok_or_else(|| {
            CompletionError::Deserialization("response contained no choices".to_string())
        })?;

        Ok(CompletionResponse {
            content: reply_text(choice.message),
            model: openai_resp.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::openai::types::{OpenAiFunctionCall, OpenAiToolCall};
    use rollcall_types::llm::Message;

    fn make_provider() -> OpenAiProvider {
        OpenAiProvider::new(
            SecretString::from("test-key-not-real"),
            "https://api.openai.com/v1".to_string(),
            Duration::from_secs(60),
        )
    }

    fn make_message(content: Option<&str>, with_tool_calls: bool) -> OpenAiResponseMessage {
        let tool_calls = with_tool_calls.then(|| {
            vec![OpenAiToolCall {
                id: "call_1".to_string(),
                call_type: "function".to_string(),
                function: OpenAiFunctionCall {
                    name: "lookup".to_string(),
                    arguments: "{}".to_string(),
                },
            }]
        });
        OpenAiResponseMessage {
            role: "assistant".to_string(),
            content: content.map(str::to_string),
            tool_calls,
        }
    }

    #[test]
    fn test_provider_name() {
        let provider = make_provider();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let provider = OpenAiProvider::new(
            SecretString::from("test-key"),
            "http://localhost:8080/v1".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(
            provider.url("/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_to_openai_request() {
        let request = CompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![Message::system("Be helpful"), Message::user("Hello")],
            max_tokens: Some(1024),
            temperature: Some(0.7),
        };

        let openai_req = OpenAiProvider::to_openai_request(&request);
        assert_eq!(openai_req.model, "gpt-4o");
        assert_eq!(openai_req.messages.len(), 2);
        assert_eq!(openai_req.messages[0].role, "system");
        assert_eq!(openai_req.messages[0].content, "Be helpful");
        assert_eq!(openai_req.messages[1].role, "user");
        assert_eq!(openai_req.max_tokens, Some(1024));
        assert_eq!(openai_req.temperature, Some(0.7));
    }

    #[test]
    fn test_reply_text_prefers_content() {
        let text = reply_text(make_message(Some("the answer"), false));
        assert_eq!(text, "the answer");
    }

    #[test]
    fn test_reply_text_keeps_content_over_tool_calls() {
        let text = reply_text(make_message(Some("partial text"), true));
        assert_eq!(text, "partial text");
    }

    #[test]
    fn test_reply_text_tool_calls_become_placeholder() {
        let text = reply_text(make_message(None, true));
        assert_eq!(text, TOOL_CALL_PLACEHOLDER);
    }

    #[test]
    fn test_reply_text_null_content_without_tool_calls_is_empty() {
        let text = reply_text(make_message(None, false));
        assert_eq!(text, "");
    }

    #[test]
    fn test_parse_error_message_standard_envelope() {
        let body = r#"{"error": {"message": "Invalid model", "type": "invalid_request_error", "code": null}}"#;
        assert_eq!(parse_error_message(body), "Invalid model");
    }

    #[test]
    fn test_parse_error_message_falls_back_to_raw_body() {
        let body = "<html>502 Bad Gateway</html>";
        assert_eq!(parse_error_message(body), body);
    }
}
