//! Session state and its transition table.
//!
//! A [`Session`] is one user request's end-to-end unit of tracked work.
//! Status transitions are monotonic through
//! `created → routing → [invoking_tool] → synthesizing → {complete|failed}`;
//! `failed` is reachable from any non-terminal state and there are no
//! backward transitions. [`Session::advance`] enforces the table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Registered, orchestrator not yet started.
    Created,
    /// The routing decision call is in flight.
    Routing,
    /// A tool dispatch is in flight.
    InvokingTool,
    /// The final-answer call is in flight.
    Synthesizing,
    /// Terminal: finished with a final answer.
    Complete,
    /// Terminal: failed with an error code.
    Failed,
}

impl SessionStatus {
    /// Whether this status ends the session.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Position in the forward ordering (terminal states share the top).
    fn rank(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Routing => 1,
            Self::InvokingTool => 2,
            Self::Synthesizing => 3,
            Self::Complete | Self::Failed => 4,
        }
    }

    /// Whether `self → next` is a legal transition.
    ///
    /// Forward-only; `Failed` is reachable from any non-terminal state;
    /// nothing leaves a terminal state. `InvokingTool` may be skipped
    /// (no-tool routing goes straight to `Synthesizing`).
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Failed {
            return true;
        }
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Routing => "routing",
            Self::InvokingTool => "invoking_tool",
            Self::Synthesizing => "synthesizing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Rejected status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid session transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// Status the session was in.
    pub from: SessionStatus,
    /// Status that was requested.
    pub to: SessionStatus,
}

/// The reasoning service's classification of a request.
///
/// Set once by the routing step, immutable thereafter. `tool_name: None`
/// means plain conversation — no tool runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    /// Tool to invoke, or `None` for a no-tool conversational reply.
    pub tool_name: Option<String>,
    /// Extracted tool arguments (name → value).
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
    /// The model's one-line justification, surfaced in the `routing` event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl RoutingDecision {
    /// A no-tool decision.
    #[must_use]
    pub fn conversation(reasoning: Option<String>) -> Self {
        Self {
            tool_name: None,
            arguments: BTreeMap::new(),
            reasoning,
        }
    }
}

/// Normalized result of one tool invocation.
///
/// Mirrors the tool backend's `{success, data|error}` envelope. A
/// `success: false` outcome is a backend-level failure: it is recorded and
/// folded into synthesis, not fatal to the session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutcome {
    /// Whether the backend reported success.
    pub success: bool,
    /// Tool output on success (opaque JSON).
    #[serde(default)]
    pub data: Value,
    /// Backend-reported error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    /// A backend-reported failure with the given message.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// One unit of tracked work for one user request.
///
/// Owned by the session manager's registry entry for its lifetime. The
/// orchestrator mutates it through the entry's lock; streaming consumers
/// only ever see it through queued events and read-only snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique identifier.
    pub id: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Original user message. Immutable once set.
    pub request_text: String,
    /// Routing decision, set once by the routing step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,
    /// Tool outcome, set at most once by the dispatch client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolOutcome>,
    /// Final answer, set exactly once on terminal success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Terminal time (set on `Complete` or `Failed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a fresh session in `Created`.
    #[must_use]
    pub fn new(id: impl Into<String>, request_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: SessionStatus::Created,
            request_text: request_text.into(),
            routing_decision: None,
            tool_result: None,
            final_answer: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move to `next`, enforcing the transition table.
    ///
    /// Stamps `completed_at` when entering a terminal status.
    pub fn advance(&mut self, next: SessionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn forward_transitions_allowed() {
        let mut s = Session::new("s1", "hi");
        s.advance(SessionStatus::Routing).unwrap();
        s.advance(SessionStatus::InvokingTool).unwrap();
        s.advance(SessionStatus::Synthesizing).unwrap();
        s.advance(SessionStatus::Complete).unwrap();
        assert!(s.completed_at.is_some());
    }

    #[test]
    fn tool_stage_may_be_skipped() {
        let mut s = Session::new("s1", "hi");
        s.advance(SessionStatus::Routing).unwrap();
        s.advance(SessionStatus::Synthesizing).unwrap();
        s.advance(SessionStatus::Complete).unwrap();
    }

    #[test]
    fn failed_reachable_from_any_non_terminal() {
        for start in [
            SessionStatus::Created,
            SessionStatus::Routing,
            SessionStatus::InvokingTool,
            SessionStatus::Synthesizing,
        ] {
            assert!(start.can_transition_to(SessionStatus::Failed), "{start}");
        }
    }

    #[test]
    fn no_backward_or_post_terminal_transitions() {
        let mut s = Session::new("s1", "hi");
        s.advance(SessionStatus::Synthesizing).unwrap();
        assert_matches!(
            s.advance(SessionStatus::Routing),
            Err(InvalidTransition { .. })
        );
        s.advance(SessionStatus::Complete).unwrap();
        assert_matches!(
            s.advance(SessionStatus::Failed),
            Err(InvalidTransition { .. })
        );
        assert_matches!(
            s.advance(SessionStatus::Synthesizing),
            Err(InvalidTransition { .. })
        );
    }

    #[test]
    fn routing_decision_deserializes_from_wire() {
        let d: RoutingDecision = serde_json::from_str(
            r#"{"toolName":"get_weather","arguments":{"city":"Tokyo"},"reasoning":"weather query"}"#,
        )
        .unwrap();
        assert_eq!(d.tool_name.as_deref(), Some("get_weather"));
        assert_eq!(d.arguments.get("city").map(String::as_str), Some("Tokyo"));
    }

    #[test]
    fn tool_outcome_envelope_round_trips() {
        let raw = r#"{"success":false,"error":"Serper API error: 500"}"#;
        let outcome: ToolOutcome = serde_json::from_str(raw).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Serper API error: 500"));
        assert_eq!(outcome.data, Value::Null);
    }
}
