//! # relay-core
//!
//! Foundation types shared across the relay workspace: the session event
//! model (ordered progress records), session state and its transition
//! table, routing decisions, and the stable error-code taxonomy surfaced
//! to clients.
//!
//! This crate is a leaf — no I/O, no async, no dependencies on the rest
//! of the workspace.

pub mod events;
pub mod metrics;
pub mod session;
pub mod tools;

pub use events::{ErrorCode, EventKind, SessionEvent};
pub use session::{InvalidTransition, RoutingDecision, Session, SessionStatus, ToolOutcome};
pub use tools::ToolDescriptor;
