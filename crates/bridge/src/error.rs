//! Unified error handling for HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application-level error type for the bridge's routes.
///
/// Batch processing errors never reach this type: they are logged by the
/// background task. Only failures that happen before a request is
/// acknowledged are turned into responses. Authentication failures are
/// rejected earlier by the
/// [`RequireSharedSecret`](crate::middleware::RequireSharedSecret) extractor.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Reject a request body that is not the expected JSON.
    #[must_use]
    pub fn invalid_body(err: &serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid JSON body: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Request rejected");

        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}
