//! Wire types for the chat completions API and the routing reply.

use std::collections::BTreeMap;

use relay_core::RoutingDecision;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ReasoningError;

/// A chat message in the request body.
#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    /// `system` or `user`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// `response_format` request parameter.
#[derive(Clone, Debug, Serialize)]
pub struct ResponseFormat {
    /// Format type; only `json_object` is used (routing call).
    #[serde(rename = "type")]
    pub format_type: &'static str,
}

impl ResponseFormat {
    /// Strict-JSON response mode.
    #[must_use]
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object",
        }
    }
}

/// Chat completions request body.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Optional strict-output mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// One completion choice in the response.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message.
    pub message: ChatResponseMessage,
}

/// The generated message body.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatResponseMessage {
    /// Generated text.
    pub content: Option<String>,
}

/// Chat completions response body (the fields relay reads).
#[derive(Clone, Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices; relay uses the first.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    /// Extract the first choice's text.
    pub fn into_text(self) -> Result<String, ReasoningError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ReasoningError::MalformedOutput("response had no choices".into()))
    }
}

/// The routing model's JSON reply:
/// `{"tool": <name or "none">, "parameters": {...}|null, "reasoning": "..."}`.
#[derive(Clone, Debug, Deserialize)]
pub struct RoutingReply {
    /// Chosen tool name, or `"none"`/null for conversation.
    pub tool: Option<String>,
    /// Extracted arguments.
    #[serde(default)]
    pub parameters: Option<Value>,
    /// One-line justification.
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Parse the routing model's raw text into a [`RoutingDecision`].
///
/// `"none"` (any case) and null both mean no tool. Parameters must be an
/// object of string-convertible values; non-string scalars are stringified
/// (models occasionally emit numbers).
pub fn parse_routing_reply(raw: &str) -> Result<RoutingDecision, ReasoningError> {
    let reply: RoutingReply = serde_json::from_str(raw)
        .map_err(|e| ReasoningError::MalformedOutput(format!("routing reply: {e}")))?;

    let tool_name = reply
        .tool
        .filter(|t| !t.eq_ignore_ascii_case("none") && !t.is_empty());

    let mut arguments = BTreeMap::new();
    if tool_name.is_some() {
        match reply.parameters {
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    let rendered = match value {
                        Value::String(s) => s,
                        Value::Null => continue,
                        other => other.to_string(),
                    };
                    let _ = arguments.insert(key, rendered);
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(ReasoningError::MalformedOutput(format!(
                    "routing parameters must be an object, got {other}"
                )));
            }
        }
    }

    Ok(RoutingDecision {
        tool_name,
        arguments,
        reasoning: reply.reasoning,
    })
}
