//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Info string
//! GET  /health            - Health check
//!
//! # Batches (shared secret in X-Shopify-Token, processed in the background)
//! POST /createProducts    - Create products and variants
//! POST /syncInventory     - Set available quantities
//! POST /syncPrice         - Set variant prices
//! POST /setFulfillment    - Fulfill orders with tracking info
//! POST /setPaid           - Mark orders as paid
//!
//! # Webhooks (relayed to the order-management system)
//! POST /productUpdate     - Variant SKU/id changes
//! POST /productDelete     - Product deletion
//! POST /orderCreation     - New order
//! ```

use axum::{
    Router,
    routing::{get, post},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::state::AppState;

pub mod sync;
pub mod webhooks;

/// Response body of `GET /`.
pub const INFO: &str = "Slim backend for inflyshop.";

/// Build the bridge's routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health))
        .route("/createProducts", post(sync::create_products))
        .route("/syncInventory", post(sync::sync_inventory))
        .route("/syncPrice", post(sync::sync_price))
        .route("/setFulfillment", post(sync::set_fulfillment))
        .route("/setPaid", post(sync::set_paid))
        .route("/productUpdate", post(webhooks::product_update))
        .route("/productDelete", post(webhooks::product_delete))
        .route("/orderCreation", post(webhooks::order_creation))
}

async fn info() -> &'static str {
    INFO
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify.
async fn health() -> &'static str {
    "ok"
}

/// Parse a JSON body regardless of its content type.
///
/// The order-management system does not always send `application/json`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::invalid_body(&e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_parse_body_accepts_json() {
        let value: Value = parse_body(br#"{"id": 1}"#).unwrap();
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let err = parse_body::<Value>(b"not json").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
