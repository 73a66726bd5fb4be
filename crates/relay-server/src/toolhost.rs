//! The tool backend's HTTP surface.
//!
//! Serves a [`ToolRegistry`] over three routes: `GET /health`,
//! `GET /tools`, and `POST /tools/call`. Every `/tools/call` reply body is
//! the `ToolOutcome` envelope, success or not, so the gateway's dispatch
//! client has one shape to parse.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics::counter;
use relay_core::ToolOutcome;
use relay_core::metrics::TOOLHOST_CALLS_TOTAL;
use relay_tools::{ToolError, ToolRegistry};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Build the toolhost router over the given registry.
pub fn toolhost_router(registry: Arc<ToolRegistry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/call", post(call_tool))
        .with_state(registry)
}

async fn health(State(registry): State<Arc<ToolRegistry>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "toolCount": registry.names().len(),
    }))
}

async fn list_tools(State(registry): State<Arc<ToolRegistry>>) -> Json<Value> {
    Json(json!({ "tools": registry.descriptors() }))
}

#[derive(Debug, Deserialize)]
struct CallRequest {
    name: String,
    #[serde(default)]
    arguments: BTreeMap<String, String>,
}

/// `POST /tools/call` — run one tool. Unknown names and missing arguments
/// come back as failure envelopes with 404/400; upstream API trouble is
/// already folded into the outcome by the tool itself, so it's a 200.
async fn call_tool(
    State(registry): State<Arc<ToolRegistry>>,
    Json(req): Json<CallRequest>,
) -> (StatusCode, Json<ToolOutcome>) {
    let Some(tool) = registry.get(&req.name) else {
        warn!(tool = %req.name, "call for unregistered tool");
        counter!(TOOLHOST_CALLS_TOTAL, "tool" => req.name.clone(), "outcome" => "unknown")
            .increment(1);
        return (
            StatusCode::NOT_FOUND,
            Json(ToolOutcome::failure(format!("unknown tool '{}'", req.name))),
        );
    };

    match tool.execute(&req.arguments).await {
        Ok(outcome) => {
            let label = if outcome.success { "ok" } else { "failed" };
            info!(tool = %req.name, success = outcome.success, "tool call served");
            counter!(TOOLHOST_CALLS_TOTAL, "tool" => req.name.clone(), "outcome" => label)
                .increment(1);
            (StatusCode::OK, Json(outcome))
        }
        Err(ToolError::MissingArgument(arg)) => {
            counter!(TOOLHOST_CALLS_TOTAL, "tool" => req.name.clone(), "outcome" => "bad_request")
                .increment(1);
            (
                StatusCode::BAD_REQUEST,
                Json(ToolOutcome::failure(format!("missing required argument '{arg}'"))),
            )
        }
        Err(ToolError::Http { message }) => {
            counter!(TOOLHOST_CALLS_TOTAL, "tool" => req.name.clone(), "outcome" => "error")
                .increment(1);
            (StatusCode::BAD_GATEWAY, Json(ToolOutcome::failure(message)))
        }
    }
}
