//! Shared handler state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use relay_runtime::{Orchestrator, SessionManager};
use relay_settings::RelaySettings;

/// Everything the gateway handlers need. Cheap to clone; all heavy parts
/// are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration.
    pub settings: Arc<RelaySettings>,
    /// Session registry, capacity, and eviction.
    pub manager: Arc<SessionManager>,
    /// The per-session state machine driver.
    pub orchestrator: Arc<Orchestrator>,
    /// Shared HTTP client for health probes.
    pub http: reqwest::Client,
    /// Renders the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
}
