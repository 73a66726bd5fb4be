//! Tool dispatch — one routing decision, one `POST /tools/call`.
//!
//! Failure classes are deliberately distinct:
//!
//! - [`DispatchError::UnknownTool`] — routing named a tool the registry
//!   doesn't have. Checked before any network call; a routing/config
//!   mismatch, fatal to the session.
//! - [`DispatchError::Transport`] / [`DispatchError::Status`] — the backend
//!   could not be reached or answered garbage. Fatal to the session.
//! - A well-formed `{success: false, error}` body — the backend worked and
//!   the tool failed. Returned as a normal [`ToolOutcome`]; the session
//!   still completes.
//!
//! No retries: one attempt per decision, bounded by the caller's timeout.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use relay_core::ToolOutcome;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Dispatch failures (all fatal to the calling session).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The named tool is not registered with the backend.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// The backend could not be reached (connect failure or timeout).
    #[error("tool backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered a non-2xx status without a readable outcome.
    #[error("tool backend returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The backend answered 2xx but the body was not an outcome envelope.
    #[error("tool backend returned a malformed body: {0}")]
    Malformed(String),
}

/// The orchestrator's seam to the tool backend.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Invoke `tool_name` with `arguments`, bounded by `timeout`.
    async fn invoke(
        &self,
        tool_name: &str,
        arguments: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<ToolOutcome, DispatchError>;
}

/// HTTP dispatcher against the relay toolhost.
pub struct HttpDispatcher {
    client: reqwest::Client,
    base_url: String,
    known_tools: BTreeSet<String>,
}

impl HttpDispatcher {
    /// Create a dispatcher for the given toolhost and known tool names.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        known_tools: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            known_tools: known_tools.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ToolDispatcher for HttpDispatcher {
    #[instrument(skip(self, arguments), fields(tool = tool_name))]
    async fn invoke(
        &self,
        tool_name: &str,
        arguments: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<ToolOutcome, DispatchError> {
        // Fail fast before any network I/O — an unknown name is a
        // routing/config mismatch, not a tool failure.
        if !self.known_tools.contains(tool_name) {
            return Err(DispatchError::UnknownTool(tool_name.to_string()));
        }

        let url = format!("{}/tools/call", self.base_url);
        let body = json!({ "name": tool_name, "arguments": arguments });
        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        // Any status with a readable outcome envelope is a backend answer,
        // including the 4xx bodies the toolhost uses for tool-level errors.
        if let Ok(outcome) = serde_json::from_str::<ToolOutcome>(&raw) {
            debug!(success = outcome.success, "tool outcome received");
            return Ok(outcome);
        }
        if status.is_success() {
            warn!(%status, "tool backend sent 2xx with unreadable body");
            return Err(DispatchError::Malformed(format!(
                "unreadable outcome: {raw:.120}"
            )));
        }
        Err(DispatchError::Status {
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn dispatcher(base_url: String) -> HttpDispatcher {
        HttpDispatcher::new(
            reqwest::Client::new(),
            base_url,
            ["get_weather".to_string(), "web_search".to_string()],
        )
    }

    fn args(key: &str, value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(key.to_string(), value.to_string())])
    }

    #[tokio::test]
    async fn unknown_tool_fails_before_any_network_call() {
        // No server at this address; the check must short-circuit.
        let dispatcher = dispatcher("http://127.0.0.1:1".into());
        let err = dispatcher
            .invoke("launch_rockets", &BTreeMap::new(), TIMEOUT)
            .await
            .unwrap_err();
        assert_matches!(err, DispatchError::UnknownTool(name) if name == "launch_rockets");
    }

    #[tokio::test]
    async fn successful_outcome_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .and(body_partial_json(
                json!({"name": "get_weather", "arguments": {"city": "Tokyo"}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"success": true, "data": {"temperature": "15°C"}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = dispatcher(server.uri())
            .invoke("get_weather", &args("city", "Tokyo"), TIMEOUT)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data["temperature"], "15°C");
    }

    #[tokio::test]
    async fn backend_reported_failure_is_a_normal_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"success": false, "error": "Serper API error: 500"}),
            ))
            .mount(&server)
            .await;

        let outcome = dispatcher(server.uri())
            .invoke("web_search", &args("query", "rust"), TIMEOUT)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Serper API error: 500"));
    }

    #[tokio::test]
    async fn error_status_with_envelope_body_is_still_an_outcome() {
        // The toolhost answers 400 for missing arguments but the body is a
        // well-formed envelope; that is a backend answer, not transport.
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"success": false, "error": "Missing 'city' parameter"}),
            ))
            .mount(&server)
            .await;

        let outcome = dispatcher(server.uri())
            .invoke("get_weather", &BTreeMap::new(), TIMEOUT)
            .await
            .unwrap();
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let dispatcher = dispatcher("http://127.0.0.1:1".into());
        let err = dispatcher
            .invoke("get_weather", &args("city", "Tokyo"), TIMEOUT)
            .await
            .unwrap_err();
        assert_matches!(err, DispatchError::Transport(_));
    }

    #[tokio::test]
    async fn bare_error_status_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = dispatcher(server.uri())
            .invoke("get_weather", &args("city", "Tokyo"), TIMEOUT)
            .await
            .unwrap_err();
        assert_matches!(err, DispatchError::Status { status: 502 });
    }
}
