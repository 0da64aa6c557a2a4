//! HTTP server for the sales coaching dialogue engine
//!
//! Exposes the dialogue, knowledge and sentiment operations as JSON routes
//! alongside health, metrics and config reload.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler, record_request};
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::SessionNotFound(_) | ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sales_coach_core::Error> for ServerError {
    fn from(err: sales_coach_core::Error) -> Self {
        use sales_coach_core::Error;
        match err {
            Error::SessionNotFound(id) => ServerError::SessionNotFound(id),
            Error::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            Error::CapacityExceeded(max) => {
                ServerError::Unavailable(format!("session limit of {} reached", max))
            },
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_coach_core::Error;

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (Error::SessionNotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (Error::CapacityExceeded(10), StatusCode::SERVICE_UNAVAILABLE),
            (Error::Store("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Llm("timeout".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(StatusCode::from(ServerError::from(err)), expected);
        }
    }
}
