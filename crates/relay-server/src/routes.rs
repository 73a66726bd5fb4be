//! Gateway routes and handlers.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use futures::stream;
use metrics::counter;
use relay_core::metrics::{EVENT_STREAMS_TOTAL, SESSIONS_CREATED_TOTAL, SESSIONS_REJECTED_TOTAL};
use relay_core::{Session, SessionEvent};
use relay_runtime::RuntimeError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::errors::ApiError;
use crate::state::AppState;

/// Upstream health probes give up after this long.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/events", get(session_events))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    session_id: String,
    status: &'static str,
}

/// `POST /sessions` — register a session and start its run in the
/// background. Replies 202 immediately; progress arrives on the event
/// stream.
async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let entry = state.manager.create(req.session_id, message).map_err(|e| {
        if matches!(e, RuntimeError::CapacityExceeded { .. }) {
            counter!(SESSIONS_REJECTED_TOTAL).increment(1);
        }
        ApiError::from(e)
    })?;
    counter!(SESSIONS_CREATED_TOTAL).increment(1);
    info!(session_id = %entry.id(), "session accepted");

    state
        .orchestrator
        .spawn(Arc::clone(&state.manager), Arc::clone(&entry));

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateSessionResponse {
            session_id: entry.id(),
            status: "created",
        }),
    ))
}

/// `GET /sessions/{id}` — point-in-time snapshot of the session record.
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(state.manager.get(&id)?))
}

/// `GET /sessions/{id}/events` — replay buffered events, then stream live
/// ones. Ends after the terminal event; comment keep-alives while idle.
async fn session_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    // Unknown id fails here, before any stream bytes go out.
    let cursor = state.manager.attach(&id)?;
    counter!(EVENT_STREAMS_TOTAL).increment(1);

    let stream = stream::unfold(cursor, |mut cursor| async move {
        let event = cursor.next().await?;
        Some((Ok(frame(&event)), cursor))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn frame(event: &SessionEvent) -> SseEvent {
    let framed = SseEvent::default().event(event.kind.as_str());
    match framed.json_data(event) {
        Ok(f) => f,
        // SessionEvent always serializes; keep the stream alive regardless.
        Err(_) => SseEvent::default()
            .event("error")
            .data(format!("{{\"sequence\":{}}}", event.sequence)),
    }
}

/// `GET /health` — report reachability of both upstreams without failing
/// the endpoint. Any response within the probe timeout counts as online.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let reasoning_url = format!("{}/models", state.settings.reasoning.base_url);
    let tools_url = format!("{}/health", state.settings.tools.base_url);
    let (reasoning, tools) = tokio::join!(
        probe(&state.http, &reasoning_url),
        probe(&state.http, &tools_url),
    );
    let status = if reasoning && tools { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "reasoning": online(reasoning),
        "toolBackend": online(tools),
    }))
}

async fn probe(client: &reqwest::Client, url: &str) -> bool {
    client
        .get(url)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .is_ok()
}

fn online(up: bool) -> &'static str {
    if up { "online" } else { "offline" }
}

/// `GET /metrics` — Prometheus text format.
async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use relay_core::{RoutingDecision, ToolDescriptor, ToolOutcome};
    use relay_llm::{ReasoningError, ReasoningService, SynthesisInput};
    use relay_runtime::{Orchestrator, SessionManager};
    use relay_settings::RelaySettings;
    use relay_tools::dispatch::{DispatchError, ToolDispatcher};
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    struct CannedReasoning;

    #[async_trait]
    impl ReasoningService for CannedReasoning {
        async fn route(
            &self,
            _request_text: &str,
            _tools: &[ToolDescriptor],
        ) -> Result<RoutingDecision, ReasoningError> {
            Ok(RoutingDecision::conversation(None))
        }

        async fn synthesize(
            &self,
            _request_text: &str,
            _input: &SynthesisInput,
        ) -> Result<String, ReasoningError> {
            Ok("canned answer".into())
        }
    }

    struct NoDispatch;

    #[async_trait]
    impl ToolDispatcher for NoDispatch {
        async fn invoke(
            &self,
            tool_name: &str,
            _arguments: &BTreeMap<String, String>,
            _timeout: Duration,
        ) -> Result<ToolOutcome, DispatchError> {
            Err(DispatchError::UnknownTool(tool_name.to_string()))
        }
    }

    fn test_state(max_concurrent: usize) -> AppState {
        let manager = Arc::new(SessionManager::new(max_concurrent, Duration::from_secs(300)));
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(CannedReasoning),
            Arc::new(NoDispatch),
            vec![],
            Duration::from_secs(15),
        ));
        AppState {
            settings: Arc::new(RelaySettings::default()),
            manager,
            orchestrator,
            http: reqwest::Client::new(),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_session_returns_202_with_id() {
        let app = router(test_state(8));
        let response = app
            .oneshot(post_json("/sessions", json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "created");
        assert!(body["sessionId"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let app = router(test_state(8));
        let response = app
            .oneshot(post_json("/sessions", json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "InvalidRequest");
    }

    #[tokio::test]
    async fn duplicate_session_id_conflicts() {
        let state = test_state(8);
        let first = router(state.clone())
            .oneshot(post_json(
                "/sessions",
                json!({"message": "hi", "sessionId": "dupe"}),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = router(state)
            .oneshot(post_json(
                "/sessions",
                json!({"message": "hi again", "sessionId": "dupe"}),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(second).await["error"]["code"], "SessionExists");
    }

    #[tokio::test]
    async fn capacity_rejection_is_503() {
        let state = test_state(1);
        // Hold the single permit with a session no orchestrator finishes.
        let _held = state.manager.create(None, "occupies the slot").unwrap();

        let response = router(state)
            .oneshot(post_json("/sessions", json!({"message": "one too many"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "CapacityExceeded"
        );
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let app = router(test_state(8));
        let response = app
            .oneshot(Request::get("/sessions/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "SessionNotFound");
    }

    #[tokio::test]
    async fn session_snapshot_is_queryable_after_completion() {
        let state = test_state(8);
        let entry = state.manager.create(Some("snap".into()), "hello").unwrap();
        state.orchestrator.run(&state.manager, &entry).await;

        let response = router(state)
            .oneshot(Request::get("/sessions/snap").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], "snap");
        assert_eq!(body["status"], "complete");
        assert_eq!(body["finalAnswer"], "canned answer");
    }

    #[tokio::test]
    async fn event_stream_replays_and_terminates() {
        let state = test_state(8);
        let entry = state.manager.create(Some("sse".into()), "hello").unwrap();
        // Finish the run first so the stream ends instead of idling.
        state.orchestrator.run(&state.manager, &entry).await;

        let response = router(state)
            .oneshot(
                Request::get("/sessions/sse/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/event-stream"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("event: status"));
        assert!(text.contains("event: routing"));
        assert!(text.contains("event: final"));
        assert!(text.contains("\"response\":\"canned answer\""));
        // Frames arrive in production order.
        let status_at = text.find("event: status").unwrap();
        let final_at = text.find("event: final").unwrap();
        assert!(status_at < final_at);
    }

    #[tokio::test]
    async fn event_stream_for_unknown_session_is_404() {
        let app = router(test_state(8));
        let response = app
            .oneshot(
                Request::get("/sessions/missing/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_text() {
        let app = router(test_state(8));
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
