//! # relay-server
//!
//! The HTTP surface. Two binaries share this crate:
//!
//! - `relay` — the gateway: accepts requests, runs the routing/dispatch/
//!   synthesis state machine in the background, and streams progress events
//!   over SSE.
//! - `relay-toolhost` — the tool backend: serves the tool registry over
//!   `GET /tools` and `POST /tools/call`.

pub mod errors;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod toolhost;

pub use errors::ApiError;
pub use routes::router;
pub use state::AppState;
pub use toolhost::toolhost_router;
