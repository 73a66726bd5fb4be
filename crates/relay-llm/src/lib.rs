//! # relay-llm
//!
//! Client for the external reasoning service — an OpenAI-compatible chat
//! completions API (the deployment target is Groq). The orchestrator talks
//! to it through the [`ReasoningService`] trait, calling it at most twice
//! per session:
//!
//! 1. **Routing** — classify the request into no-tool or a specific tool
//!    with extracted arguments (strict-JSON response mode).
//! 2. **Synthesis** — turn the raw request or the tool result into the
//!    final natural-language answer.
//!
//! Tests substitute the trait with in-process fakes; [`ChatClient`] is the
//! production implementation.

pub mod client;
pub mod errors;
pub mod prompts;
pub mod types;

pub use client::{ChatClient, ChatConfig};
pub use errors::ReasoningError;

use async_trait::async_trait;
use relay_core::{RoutingDecision, ToolDescriptor};
use serde_json::Value;

/// Context handed to the synthesis call.
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesisInput {
    /// No tool ran — answer the request conversationally.
    Conversation,
    /// A tool ran successfully; answer from its output.
    ToolData(Value),
    /// The tool backend reported a failure; explain it to the user.
    ToolFailure(String),
}

/// The reasoning-service boundary.
///
/// Both calls are single request/response operations bounded by the
/// client's configured timeout.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Classify `request_text` against the available tools.
    async fn route(
        &self,
        request_text: &str,
        tools: &[ToolDescriptor],
    ) -> Result<RoutingDecision, ReasoningError>;

    /// Produce the final natural-language answer.
    async fn synthesize(
        &self,
        request_text: &str,
        input: &SynthesisInput,
    ) -> Result<String, ReasoningError>;
}
