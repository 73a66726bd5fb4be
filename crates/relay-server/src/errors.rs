//! HTTP error mapping.
//!
//! Every failure a handler can produce becomes an [`ApiError`], which
//! renders as `{"error": {"code", "message"}}` with the stable taxonomy
//! code. Session-lookup and capacity failures surface here synchronously;
//! failures inside a running session surface as `error` events on the
//! stream instead.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_runtime::RuntimeError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Handler-level failure, mapped to an HTTP status and a taxonomy code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed validation.
    #[error("message must not be empty")]
    EmptyMessage,

    /// No session with the given id.
    #[error("session '{0}' not found")]
    NotFound(String),

    /// A session with the caller-supplied id already exists.
    #[error("session '{0}' already exists")]
    SessionExists(String),

    /// Concurrent-session capacity reached.
    #[error("server at capacity ({0} concurrent sessions)")]
    Capacity(usize),

    /// Anything else from the runtime.
    #[error(transparent)]
    Runtime(RuntimeError),
}

impl From<RuntimeError> for ApiError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::SessionNotFound(id) => Self::NotFound(id),
            RuntimeError::SessionExists(id) => Self::SessionExists(id),
            RuntimeError::CapacityExceeded { max } => Self::Capacity(max),
            other => Self::Runtime(other),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::EmptyMessage => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionExists(_) => StatusCode::CONFLICT,
            Self::Capacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Runtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "InvalidRequest",
            Self::NotFound(_) => "SessionNotFound",
            Self::SessionExists(_) => "SessionExists",
            Self::Capacity(_) => "CapacityExceeded",
            Self::Runtime(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = self.code(), error = %self, "request failed");
        }
        let body = json!({
            "error": { "code": self.code(), "message": self.to_string() }
        });
        (status, Json(body)).into_response()
    }
}
