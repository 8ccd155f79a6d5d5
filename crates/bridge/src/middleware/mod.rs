//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (propagate or generate `x-request-id`)
//!
//! Shared-secret authentication is an extractor applied per route.

pub mod auth;
pub mod request_id;

pub use auth::{
    AUTH_COMPLETED, AUTH_FAILED, AuthRejection, RequireSharedSecret, SHARED_SECRET_HEADER,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
