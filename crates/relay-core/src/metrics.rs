//! Metric name constants.
//!
//! Metrics are recorded where the state lives (session manager, HTTP
//! routes, toolhost); the names live here so the recording site and the
//! exported name cannot drift apart.

/// Sessions created total (counter).
pub const SESSIONS_CREATED_TOTAL: &str = "sessions_created_total";
/// Sessions rejected at capacity (counter).
pub const SESSIONS_REJECTED_TOTAL: &str = "sessions_rejected_total";
/// Active sessions (gauge; recorded by the session manager).
pub const SESSIONS_ACTIVE: &str = "sessions_active";
/// SSE streams opened total (counter).
pub const EVENT_STREAMS_TOTAL: &str = "event_streams_total";
/// Tool calls served by the toolhost (counter, labels: tool, outcome).
pub const TOOLHOST_CALLS_TOTAL: &str = "toolhost_calls_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_snake_case() {
        for name in [
            SESSIONS_CREATED_TOTAL,
            SESSIONS_REJECTED_TOTAL,
            SESSIONS_ACTIVE,
            EVENT_STREAMS_TOTAL,
            TOOLHOST_CALLS_TOTAL,
        ] {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
