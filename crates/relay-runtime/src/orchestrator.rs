//! The session state machine.
//!
//! `Created → Routing → [InvokingTool] → Synthesizing → Complete`, with
//! `Failed` reachable from any non-terminal state. The stage-to-stage
//! decisions live in pure functions ([`after_routing`], [`after_dispatch`],
//! [`after_synthesis`]) so each transition is unit-testable without I/O;
//! [`Orchestrator::run`] drives them, emits the progress events, and owns
//! the one invariant everything else leans on: every run ends with exactly
//! one terminal event, no matter which stage failed.

use std::sync::Arc;
use std::time::Duration;

use relay_core::events::{
    error_payload, final_payload, routing_payload, status_payload, tool_result_payload,
};
use relay_core::{ErrorCode, EventKind, RoutingDecision, SessionStatus, ToolDescriptor, ToolOutcome};
use relay_llm::{ReasoningError, ReasoningService, SynthesisInput};
use relay_tools::{DispatchError, ToolDispatcher};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::errors::RuntimeError;
use crate::manager::{SessionEntry, SessionManager};

/// Where a run is headed next.
#[derive(Debug)]
pub enum Stage {
    /// Classify the request.
    Routing,
    /// Dispatch the decided tool.
    InvokingTool(RoutingDecision),
    /// Produce the final answer from the given input.
    Synthesizing(SynthesisInput),
    /// Terminal success with the final answer.
    Complete(String),
    /// Terminal failure with a taxonomy code.
    Failed {
        /// Stable error code for the `error` event.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },
}

/// Taxonomy code for an internal abort, keyed by how far the run got.
fn abort_code(status: SessionStatus) -> ErrorCode {
    match status {
        SessionStatus::InvokingTool => ErrorCode::ToolTransportError,
        SessionStatus::Synthesizing => ErrorCode::SynthesisServiceError,
        _ => ErrorCode::RoutingServiceError,
    }
}

/// Next stage after the routing call.
#[must_use]
pub fn after_routing(result: Result<RoutingDecision, ReasoningError>) -> Stage {
    match result {
        Ok(decision) if decision.tool_name.is_some() => Stage::InvokingTool(decision),
        Ok(_) => Stage::Synthesizing(SynthesisInput::Conversation),
        Err(e) => Stage::Failed {
            code: ErrorCode::RoutingServiceError,
            message: e.to_string(),
        },
    }
}

/// Next stage after tool dispatch.
///
/// A backend-reported failure (`success: false`) continues to synthesis
/// with the failure as context; only transport-level problems and unknown
/// tools fail the session.
#[must_use]
pub fn after_dispatch(result: Result<ToolOutcome, DispatchError>) -> Stage {
    match result {
        Ok(outcome) if outcome.success => {
            Stage::Synthesizing(SynthesisInput::ToolData(outcome.data))
        }
        Ok(outcome) => {
            let reason = outcome.error.unwrap_or_else(|| "unspecified tool failure".into());
            Stage::Synthesizing(SynthesisInput::ToolFailure(reason))
        }
        Err(DispatchError::UnknownTool(name)) => Stage::Failed {
            code: ErrorCode::UnknownTool,
            message: format!("routing chose unregistered tool '{name}'"),
        },
        Err(e) => Stage::Failed {
            code: ErrorCode::ToolTransportError,
            message: e.to_string(),
        },
    }
}

/// Next stage after the synthesis call.
#[must_use]
pub fn after_synthesis(result: Result<String, ReasoningError>) -> Stage {
    match result {
        Ok(answer) => Stage::Complete(answer),
        Err(e) => Stage::Failed {
            code: ErrorCode::SynthesisServiceError,
            message: e.to_string(),
        },
    }
}

/// Drives one session from `Created` to a terminal state.
pub struct Orchestrator {
    reasoning: Arc<dyn ReasoningService>,
    dispatcher: Arc<dyn ToolDispatcher>,
    tools: Vec<ToolDescriptor>,
    dispatch_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator over the given service boundaries.
    #[must_use]
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        dispatcher: Arc<dyn ToolDispatcher>,
        tools: Vec<ToolDescriptor>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            reasoning,
            dispatcher,
            tools,
            dispatch_timeout,
        }
    }

    /// Launch a run as an independent background task.
    ///
    /// Consumer disconnects never cancel it; the session's permit is
    /// released when the run ends.
    pub fn spawn(self: &Arc<Self>, manager: Arc<SessionManager>, entry: Arc<SessionEntry>) {
        let orchestrator = Arc::clone(self);
        drop(tokio::spawn(async move {
            orchestrator.run(&manager, &entry).await;
        }));
    }

    /// Run one session to its terminal state.
    ///
    /// Never panics the process and never leaves the session without a
    /// terminal event: internal errors fall through to a best-effort
    /// `error` event and `Failed` status.
    #[instrument(skip_all, fields(session_id = %entry.id()))]
    pub async fn run(&self, manager: &SessionManager, entry: &Arc<SessionEntry>) {
        if let Err(e) = self.drive(entry).await {
            // A push or transition failed mid-run. The queue enforces the
            // single-terminal-event invariant, so only attempt a terminal
            // event if none has been produced yet.
            error!(error = %e, "orchestrator run aborted internally");
            if !entry.queue().is_closed() {
                let code = abort_code(entry.snapshot().status);
                let _ = entry.update(|s| s.advance(SessionStatus::Failed));
                let _ = entry
                    .queue()
                    .push(EventKind::Error, error_payload(code, e.to_string()));
            }
        }
        manager.finish(entry);
    }

    async fn drive(&self, entry: &Arc<SessionEntry>) -> Result<(), RuntimeError> {
        let request_text = entry.snapshot().request_text;
        let queue = Arc::clone(entry.queue());

        entry.advance(SessionStatus::Routing)?;
        let _ = queue.push(EventKind::Status, status_payload("analyzing request"))?;

        let routed = self.reasoning.route(&request_text, &self.tools).await;
        if let Ok(decision) = &routed {
            entry.update(|s| s.routing_decision = Some(decision.clone()));
        }

        let stage = match after_routing(routed) {
            Stage::InvokingTool(decision) => {
                let tool_name = decision
                    .tool_name
                    .clone()
                    .unwrap_or_default();
                let _ = queue.push(
                    EventKind::Status,
                    status_payload(format!("calling tool {tool_name}")),
                )?;
                let _ = queue.push(
                    EventKind::Routing,
                    routing_payload(Some(&tool_name), decision.reasoning.as_deref()),
                )?;
                entry.advance(SessionStatus::InvokingTool)?;
                let _ = queue.push(
                    EventKind::Status,
                    status_payload(format!("running {tool_name}")),
                )?;

                let dispatched = self
                    .dispatcher
                    .invoke(&tool_name, &decision.arguments, self.dispatch_timeout)
                    .await;
                if let Ok(outcome) = &dispatched {
                    entry.update(|s| s.tool_result = Some(outcome.clone()));
                    let body = json!({
                        "data": outcome.data,
                        "error": outcome.error,
                    });
                    let _ = queue.push(
                        EventKind::ToolResult,
                        tool_result_payload(&tool_name, outcome.success, &body),
                    )?;
                }
                after_dispatch(dispatched)
            }
            Stage::Synthesizing(input) => {
                // No-tool path: the routing event still reports the decision.
                let reasoning = entry
                    .snapshot()
                    .routing_decision
                    .and_then(|d| d.reasoning);
                let _ = queue.push(
                    EventKind::Routing,
                    routing_payload(None, reasoning.as_deref()),
                )?;
                Stage::Synthesizing(input)
            }
            failed @ Stage::Failed { .. } => failed,
            other => other,
        };

        let stage = match stage {
            Stage::Synthesizing(input) => {
                entry.advance(SessionStatus::Synthesizing)?;
                after_synthesis(self.reasoning.synthesize(&request_text, &input).await)
            }
            other => other,
        };

        match stage {
            Stage::Complete(answer) => {
                entry.update(|s| s.final_answer = Some(answer.clone()));
                entry.advance(SessionStatus::Complete)?;
                let _ = queue.push(EventKind::Final, final_payload(answer))?;
                info!("session complete");
            }
            Stage::Failed { code, message } => {
                warn!(code = %code, %message, "session failed");
                entry.advance(SessionStatus::Failed)?;
                let _ = queue.push(EventKind::Error, error_payload(code, message))?;
            }
            // drive() always reduces to a terminal stage above.
            Stage::Routing | Stage::InvokingTool(_) | Stage::Synthesizing(_) => {
                unreachable!("non-terminal stage after synthesis step")
            }
        }
        Ok(())
    }
}
