//! # relay-tools
//!
//! The tool side of relay:
//!
//! - [`RelayTool`] — the per-tool contract (name, description, argument
//!   schema, execute). Implementations fold upstream API failures into
//!   `ToolOutcome { success: false, error }` rather than erroring, so a
//!   flaky weather API degrades a single answer, not the session.
//! - [`ToolRegistry`] — name → tool. Adding a tool is a registration; the
//!   orchestrator and dispatch client never change per tool.
//! - [`HttpDispatcher`] — the gateway-side client that turns a routing
//!   decision into one `POST /tools/call` against the toolhost, separating
//!   transport failures (fatal to the session) from backend-reported
//!   failures (folded into synthesis).

pub mod dispatch;
pub mod errors;
pub mod http;
pub mod registry;
pub mod testutil;
pub mod traits;
pub mod weather;
pub mod web_search;

pub use dispatch::{DispatchError, HttpDispatcher, ToolDispatcher};
pub use errors::ToolError;
pub use http::ReqwestHttp;
pub use registry::ToolRegistry;
pub use traits::{HttpClient, HttpResponse, RelayTool};
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;
