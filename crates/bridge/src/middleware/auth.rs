//! Shared-secret authentication for the order-management system's calls.
//!
//! The caller sends the configured `SHOPIFY_API_SECRET` verbatim in the
//! `X-Shopify-Token` header. Anything else is rejected before the body is
//! read.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;

use crate::state::AppState;

/// Header carrying the shared secret.
pub const SHARED_SECRET_HEADER: &str = "x-shopify-token";

/// Body sent when authentication fails.
pub const AUTH_FAILED: &str = "Authorization failed.";

/// Body sent when authentication succeeds and the batch is accepted.
pub const AUTH_COMPLETED: &str = "Authorization completed.";

/// Extractor that requires the shared secret.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_auth: RequireSharedSecret) -> &'static str {
///     AUTH_COMPLETED
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireSharedSecret;

/// Error returned when the shared secret is missing or wrong.
#[derive(Debug, Clone, Copy)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, AUTH_FAILED).into_response()
    }
}

impl FromRequestParts<AppState> for RequireSharedSecret {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(SHARED_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());

        if presented == Some(state.config().shopify.api_secret.expose_secret()) {
            tracing::info!(path = parts.uri.path(), "Authorization complete.");
            Ok(Self)
        } else {
            tracing::warn!(
                path = parts.uri.path(),
                header_present = presented.is_some(),
                "Authorization failed."
            );
            Err(AuthRejection)
        }
    }
}
