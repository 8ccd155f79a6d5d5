//! Shopify webhooks relayed to the order-management system.
//!
//! These routes are not authenticated. They answer immediately and forward
//! the event in the background.

use axum::{body::Bytes, extract::State};
use inflyshop_bridge_core::{ProductDeleteWebhook, ProductUpdateWebhook, VariantLink};
use serde_json::Value;

use super::parse_body;
use crate::error::AppError;
use crate::services::Notification;
use crate::state::AppState;

pub const UPDATE_ACK: &str = "Successful update - response";
pub const DELETE_ACK: &str = "Successful deletion - response";
pub const ORDER_ACK: &str = "Successful payment - response";

/// `POST /productUpdate`
pub async fn product_update(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let webhook: ProductUpdateWebhook = parse_body(&body)?;
    state.notifier().notify_detached(product_update_notification(webhook));
    Ok(UPDATE_ACK)
}

/// `POST /productDelete`
pub async fn product_delete(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let webhook: ProductDeleteWebhook = parse_body(&body)?;
    state.notifier().notify_detached(Notification::ProductDelete {
        shopify_product_id: webhook.id,
    });
    Ok(DELETE_ACK)
}

/// `POST /orderCreation`
pub async fn order_creation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let order: Value = parse_body(&body)?;
    state.notifier().notify_detached(Notification::OrderCreation(order));
    Ok(ORDER_ACK)
}

fn product_update_notification(webhook: ProductUpdateWebhook) -> Notification {
    Notification::ProductUpdate {
        shopify_product_id: webhook.id,
        variants: webhook
            .variants
            .into_iter()
            .map(|variant| VariantLink {
                sku: variant.sku,
                shopify_variant_id: variant.id,
            })
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inflyshop_bridge_core::ExternalId;
    use serde_json::json;

    #[test]
    fn test_product_update_maps_variants() {
        let webhook: ProductUpdateWebhook = serde_json::from_value(json!({
            "id": 632_910_392,
            "title": "IPod Nano",
            "variants": [
                {"id": 808_950_810, "sku": "IPOD2008PINK"},
                {"id": 49_148_385, "sku": null}
            ]
        }))
        .unwrap();

        let Notification::ProductUpdate {
            shopify_product_id,
            variants,
        } = product_update_notification(webhook)
        else {
            panic!("expected a product update");
        };

        assert_eq!(shopify_product_id, ExternalId::Number(632_910_392));
        assert_eq!(
            variants,
            vec![
                VariantLink {
                    sku: Some("IPOD2008PINK".to_string()),
                    shopify_variant_id: ExternalId::Number(808_950_810),
                },
                VariantLink {
                    sku: None,
                    shopify_variant_id: ExternalId::Number(49_148_385),
                },
            ]
        );
    }
}
