//! # relay-runtime
//!
//! The session orchestration core:
//!
//! - [`EventQueue`] — per-session, append-only buffer of ordered progress
//!   events with blocking reads and replayable history.
//! - [`SessionManager`] — process-wide registry of live sessions with
//!   semaphore-bounded capacity and grace-period eviction.
//! - [`Orchestrator`] — the routing → optional tool dispatch → synthesis
//!   state machine, run as one background task per session, guaranteed to
//!   end every session with exactly one terminal event.

pub mod errors;
pub mod manager;
pub mod orchestrator;
pub mod queue;

pub use errors::RuntimeError;
pub use manager::{SessionEntry, SessionManager};
pub use orchestrator::{Orchestrator, Stage};
pub use queue::{EventCursor, EventQueue};
