//! Runtime errors.

use thiserror::Error;

/// Errors from session management and orchestration.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The concurrent-session limit is reached.
    #[error("session capacity exceeded (max {max})")]
    CapacityExceeded {
        /// Configured maximum.
        max: usize,
    },

    /// A session with this id already exists (at most one run per id).
    #[error("session '{0}' already exists")]
    SessionExists(String),

    /// Unknown or already-evicted session id.
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    /// Eviction was requested for a session that has not finished.
    #[error("session '{0}' is not terminal")]
    SessionNotTerminal(String),

    /// An event was pushed after the terminal event.
    #[error("event queue for session '{0}' is closed")]
    QueueClosed(String),

    /// A status update violated the transition table.
    #[error(transparent)]
    InvalidTransition(#[from] relay_core::InvalidTransition),
}
