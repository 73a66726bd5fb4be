//! Reasoning-service errors.

use thiserror::Error;

/// Errors from the reasoning service.
///
/// The orchestrator maps these onto `RoutingServiceError` or
/// `SynthesisServiceError` depending on which stage made the call.
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// Network-level failure, including timeouts.
    #[error("reasoning request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("reasoning service returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be interpreted (bad JSON, empty
    /// choices, routing reply not matching the expected shape).
    #[error("malformed reasoning output: {0}")]
    MalformedOutput(String),
}
