//! Session progress events.
//!
//! A [`SessionEvent`] is an immutable, ordered progress record: base fields
//! (`sequence`, `kind`, `timestamp`) at the top level and a kind-specific
//! `payload` stored as opaque [`serde_json::Value`]. Sequence numbers are
//! assigned by the queue at enqueue time and define delivery order.
//!
//! Exactly one terminal event (`final` or `error`) is produced per session;
//! the queue rejects appends after it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Discriminator for session progress events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Human-readable progress note ("analyzing request").
    Status,
    /// The routing decision, with the model's reasoning summary.
    Routing,
    /// Outcome of a tool invocation (success or backend-reported failure).
    ToolResult,
    /// Terminal: the final natural-language answer.
    Final,
    /// Terminal: the session failed with a stable error code.
    Error,
}

impl EventKind {
    /// Whether this kind ends a session's event stream.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Final | Self::Error)
    }

    /// Wire string for this kind (matches the serde rename).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Routing => "routing",
            Self::ToolResult => "tool_result",
            Self::Final => "final",
            Self::Error => "error",
        }
    }
}

/// Stable error codes surfaced in `error` events and synchronous API errors.
///
/// Clients key off these strings; they never change meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The reasoning call for routing failed, timed out, or returned
    /// unparseable output.
    RoutingServiceError,
    /// Routing named a tool not present in the registry.
    UnknownTool,
    /// The tool backend could not be reached (or timed out).
    ToolTransportError,
    /// The tool backend was reached and reported its own failure.
    /// Recovered locally — never terminal on its own.
    ToolBackendFailure,
    /// The reasoning call for the final answer failed.
    SynthesisServiceError,
    /// The concurrent-session limit was reached.
    CapacityExceeded,
    /// Unknown or already-evicted session id.
    SessionNotFound,
}

impl ErrorCode {
    /// Stable wire string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoutingServiceError => "RoutingServiceError",
            Self::UnknownTool => "UnknownTool",
            Self::ToolTransportError => "ToolTransportError",
            Self::ToolBackendFailure => "ToolBackendFailure",
            Self::SynthesisServiceError => "SynthesisServiceError",
            Self::CapacityExceeded => "CapacityExceeded",
            Self::SessionNotFound => "SessionNotFound",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered progress record within a session.
///
/// Never mutated after creation. `sequence` is unique within a session,
/// starts at 1, and increases without gaps in production order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    /// Monotonic sequence number within the session.
    pub sequence: u64,
    /// Event kind discriminator.
    pub kind: EventKind,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Kind-specific data (opaque JSON).
    pub payload: Value,
}

impl SessionEvent {
    /// Create an event with the given sequence, stamped now.
    #[must_use]
    pub fn new(sequence: u64, kind: EventKind, payload: Value) -> Self {
        Self {
            sequence,
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Whether this event ends the session's stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload factories
// ─────────────────────────────────────────────────────────────────────────────

/// Payload for a `status` event.
#[must_use]
pub fn status_payload(message: impl Into<String>) -> Value {
    json!({ "message": message.into() })
}

/// Payload for a `routing` event.
#[must_use]
pub fn routing_payload(tool: Option<&str>, reasoning: Option<&str>) -> Value {
    json!({ "tool": tool, "reasoning": reasoning })
}

/// Payload for a `tool_result` event.
#[must_use]
pub fn tool_result_payload(tool: &str, success: bool, body: &Value) -> Value {
    json!({ "tool": tool, "success": success, "result": body })
}

/// Payload for the terminal `final` event.
#[must_use]
pub fn final_payload(answer: impl Into<String>) -> Value {
    json!({ "response": answer.into() })
}

/// Payload for the terminal `error` event.
#[must_use]
pub fn error_payload(code: ErrorCode, message: impl Into<String>) -> Value {
    json!({ "code": code.as_str(), "message": message.into() })
}
