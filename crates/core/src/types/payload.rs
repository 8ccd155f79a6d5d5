//! Inbound webhook payloads sent by the order-management system.
//!
//! Field names follow the JSON the external system produces. Optional fields
//! are defaulted when omitted. Identifiers and prices are required: a body
//! with a record missing one is rejected as a whole.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ExternalId;
use super::lenient::lenient_int;

/// Body of `POST /createProducts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductsRequest {
    #[serde(default)]
    pub products: Vec<ProductPayload>,
}

/// One product with its variants.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub product_info: ProductInfo,
    #[serde(default)]
    pub variants: Vec<VariantPayload>,
}

/// Product-level attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInfo {
    /// Product id in the order-management system.
    pub product_id: ExternalId,
    /// Shopify product id, absent or blank when the product does not exist yet.
    #[serde(default)]
    pub shopify_product_id: Option<ExternalId>,
    #[serde(default)]
    pub title: String,
    /// Product description, sent to Shopify as HTML.
    #[serde(default)]
    pub description: Option<String>,
    /// Option names (e.g. `["Size", "Color"]`).
    #[serde(default)]
    pub options: Vec<String>,
    /// Image URLs; empty entries are skipped.
    #[serde(default)]
    pub images: Vec<Option<String>>,
    /// Accepted for compatibility; products are always created unpublished.
    #[serde(default)]
    pub published: Option<bool>,
}

impl ProductInfo {
    /// The Shopify product id, if the product has already been created.
    #[must_use]
    pub fn upstream_id(&self) -> Option<&ExternalId> {
        self.shopify_product_id.as_ref().filter(|id| !id.is_blank())
    }

    /// Non-empty image URLs in their original order.
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .filter_map(|image| image.as_deref())
            .map(str::trim)
            .filter(|src| !src.is_empty())
    }
}

/// A product variant.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Weight, reduced to its leading integer.
    #[serde(default, deserialize_with = "lenient_int")]
    pub weight: Option<i64>,
    /// Option values matching the product's option names.
    #[serde(default)]
    pub options: Vec<String>,
    /// Initial stock at the configured location.
    #[serde(default, deserialize_with = "lenient_int")]
    pub quantity: Option<i64>,
    /// Shopify variant id, absent or blank when the variant does not exist yet.
    #[serde(default)]
    pub shopify_variant_id: Option<ExternalId>,
}

impl VariantPayload {
    /// The Shopify variant id, if the variant has already been created.
    #[must_use]
    pub fn upstream_id(&self) -> Option<&ExternalId> {
        self.shopify_variant_id.as_ref().filter(|id| !id.is_blank())
    }
}

/// One record of `POST /syncInventory`.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryRecord {
    pub shopify_variant_id: ExternalId,
    /// Desired available quantity at the configured location.
    #[serde(default, deserialize_with = "lenient_int")]
    pub quantity: Option<i64>,
}

/// One record of `POST /syncPrice`.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRecord {
    pub shopify_variant_id: ExternalId,
    pub price: Decimal,
}

/// One record of `POST /setFulfillment`.
#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentRequest {
    pub shopify_order_id: ExternalId,
    /// Order id in the order-management system (logged only).
    #[serde(default)]
    pub order_id: Option<ExternalId>,
    #[serde(default)]
    pub tracking_company: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

/// One record of `POST /setPaid`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMarkRequest {
    pub shopify_order_id: ExternalId,
}

/// Body of `POST /productUpdate` (a Shopify product webhook, relayed).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdateWebhook {
    /// Shopify product id.
    pub id: ExternalId,
    #[serde(default)]
    pub variants: Vec<WebhookVariant>,
}

/// Variant entry inside a product webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookVariant {
    /// Shopify variant id.
    pub id: ExternalId,
    #[serde(default)]
    pub sku: Option<String>,
}

/// Body of `POST /productDelete`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDeleteWebhook {
    /// Shopify product id.
    pub id: ExternalId,
}

/// A `{sku, shopify_variant_id}` pair reported back downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantLink {
    pub sku: Option<String>,
    pub shopify_variant_id: ExternalId,
}
