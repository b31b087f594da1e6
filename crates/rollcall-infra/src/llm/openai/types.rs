//! OpenAI Chat Completions API types.
//!
//! These are OpenAI-specific request/response structures used for HTTP
//! communication with the Chat Completions endpoint. They are NOT the
//! generic completion types from rollcall-types -- those are
//! provider-agnostic.

use serde::{Deserialize, Serialize};

/// Request body for the Chat Completions API.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// A single message in a Chat Completions conversation.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiMessage {
    pub role: String,
    pub content: String,
}

/// Response body for a non-streaming chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponse {
    pub model: String,
    pub choices: Vec<OpenAiChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiResponseMessage,
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
///
/// `content` is null when the model answered with tool calls instead of
/// text, so it deserializes as an `Option`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponseMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
}

/// A tool call in the assistant message.
///
/// Tool use is not part of the chat flow; its presence only selects the
/// placeholder reply.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAiFunctionCall,
}

/// The function invocation inside a tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Token usage from the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Error envelope from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiError,
}

/// An error object from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_omits_none_fields() {
        let request = OpenAiRequest {
            model: "gpt-4o".to_string(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            max_tokens: None,
            temperature: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"gpt-4o\""));
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_request_serialization_with_options() {
        let request = OpenAiRequest {
            model: "gpt-4o".to_string(),
            messages: vec![],
            max_tokens: Some(512),
            temperature: Some(0.2),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"max_tokens\":512"));
        assert!(json.contains("\"temperature\":0.2"));
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;

        let resp: OpenAiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.model, "gpt-4o-2024-08-06");
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("Hello!"));
        assert_eq!(resp.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.usage.as_ref().unwrap().total_tokens, 15);
    }

    #[test]
    fn test_response_deserialization_null_content_with_tool_calls() {
        let json = r#"{
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "lookup", "arguments": "{\"q\":\"x\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;

        let resp: OpenAiResponse = serde_json::from_str(json).unwrap();
        let message = &resp.choices[0].message;
        assert!(message.content.is_none());
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "lookup");
    }

    #[test]
    fn test_response_deserialization_missing_usage() {
        let json = r#"{
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hi"},
                "finish_reason": "stop"
            }]
        }"#;

        let resp: OpenAiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.usage.is_none());
    }

    #[test]
    fn test_error_envelope_deserialization() {
        let json = r#"{
            "error": {
                "message": "Rate limit reached for gpt-4o",
                "type": "tokens",
                "code": "rate_limit_exceeded"
            }
        }"#;

        let envelope: OpenAiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.error.message, "Rate limit reached for gpt-4o");
        assert_eq!(envelope.error.code.as_deref(), Some("rate_limit_exceeded"));
    }
}
