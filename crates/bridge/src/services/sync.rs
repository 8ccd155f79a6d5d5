//! Translation of inbound batch records into Admin API calls.
//!
//! Each [`BatchItem`] maps to one short sequence of upstream calls and at
//! most one downstream notification. Failures are logged and reported to
//! the dispatcher; they never abort a batch.

use inflyshop_bridge_core::{
    ExternalId, FulfillmentRequest, Gid, GidKind, InventoryRecord, PaymentMarkRequest,
    PriceRecord, ProductPayload, VariantLink, VariantPayload,
};
use thiserror::Error;
use tracing::instrument;

use crate::dispatch::{BatchDispatcher, BatchSummary, ItemReport};
use crate::shopify::{
    AdminClient, CreatedVariant, NewProduct, NewVariant, Quota, ShopifyError, TrackingInfo,
};

use super::notifier::{Notification, Notifier};

/// Why a batch item failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    /// A lookup succeeded but the resource was absent.
    #[error("{what} not found")]
    Missing {
        what: &'static str,
        quota: Option<Quota>,
    },

    /// The inbound record cannot be processed.
    #[error("Invalid record: {0}")]
    Invalid(String),
}

impl SyncError {
    /// Quota reported by the call that failed, if any.
    #[must_use]
    pub const fn quota(&self) -> Option<Quota> {
        match self {
            Self::Shopify(e) => e.quota(),
            Self::Missing { quota, .. } => *quota,
            Self::Invalid(_) => None,
        }
    }
}

/// The kinds of batch the HTTP routes submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batch {
    CreateProducts,
    SyncInventory,
    SyncPrice,
    SetFulfillment,
    SetPaid,
}

impl Batch {
    /// Number of items between two barriers.
    #[must_use]
    pub const fn modulus(self) -> usize {
        match self {
            Self::CreateProducts => 50,
            Self::SyncInventory | Self::SyncPrice => 10,
            Self::SetFulfillment | Self::SetPaid => 20,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateProducts => "createProducts",
            Self::SyncInventory => "syncInventory",
            Self::SyncPrice => "syncPrice",
            Self::SetFulfillment => "setFulfillment",
            Self::SetPaid => "setPaid",
        }
    }
}

/// One unit of upstream work.
#[derive(Debug, Clone)]
pub enum BatchItem {
    /// A product that does not exist in Shopify yet.
    CreateProduct(ProductPayload),
    /// A new variant of a product that already exists in Shopify.
    CreateVariant {
        product_id: ExternalId,
        shopify_product_id: ExternalId,
        variant: VariantPayload,
    },
    SyncInventory(InventoryRecord),
    SyncPrice(PriceRecord),
    Fulfill(FulfillmentRequest),
    MarkPaid(PaymentMarkRequest),
}

impl BatchItem {
    /// Flatten a `createProducts` body into items.
    ///
    /// Products without a Shopify id become one [`BatchItem::CreateProduct`]
    /// each. For products that already exist, every variant without a
    /// Shopify id becomes a [`BatchItem::CreateVariant`]; the rest is skipped.
    #[must_use]
    pub fn from_products(products: Vec<ProductPayload>) -> Vec<Self> {
        let mut items = Vec::with_capacity(products.len());

        for product in products {
            let Some(shopify_product_id) = product.product_info.upstream_id().cloned() else {
                items.push(Self::CreateProduct(product));
                continue;
            };

            let product_id = product.product_info.product_id;
            items.extend(
                product
                    .variants
                    .into_iter()
                    .filter(|variant| variant.upstream_id().is_none())
                    .map(|variant| Self::CreateVariant {
                        product_id: product_id.clone(),
                        shopify_product_id: shopify_product_id.clone(),
                        variant,
                    }),
            );
        }

        items
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateProduct(_) => "create_product",
            Self::CreateVariant { .. } => "create_variant",
            Self::SyncInventory(_) => "sync_inventory",
            Self::SyncPrice(_) => "sync_price",
            Self::Fulfill(_) => "fulfill",
            Self::MarkPaid(_) => "mark_paid",
        }
    }
}

/// Signed adjustment that brings `current` stock to `desired`.
#[must_use]
pub const fn inventory_delta(desired: i64, current: i64) -> i64 {
    desired.saturating_sub(current)
}

/// Runs batch items against Shopify and reports results downstream.
#[derive(Debug, Clone)]
pub struct SyncService {
    admin: AdminClient,
    notifier: Notifier,
    dispatcher: BatchDispatcher,
}

impl SyncService {
    #[must_use]
    pub const fn new(admin: AdminClient, notifier: Notifier, dispatcher: BatchDispatcher) -> Self {
        Self {
            admin,
            notifier,
            dispatcher,
        }
    }

    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Process a whole batch.
    pub async fn run_batch(&self, batch: Batch, items: Vec<BatchItem>) -> BatchSummary {
        self.dispatcher
            .run(batch.label(), items, batch.modulus(), |item| {
                let service = self.clone();
                async move { service.process(item).await }
            })
            .await
    }

    /// Process a batch on a background task.
    pub fn spawn_batch(&self, batch: Batch, items: Vec<BatchItem>) {
        let service = self.clone();
        tokio::spawn(async move {
            service.run_batch(batch, items).await;
        });
    }

    /// Process one item, logging any failure.
    pub async fn process(&self, item: BatchItem) -> ItemReport {
        let kind = item.kind();
        match self.apply(item).await {
            Ok(quota) => ItemReport::success(quota),
            Err(e) => {
                tracing::error!(item = kind, error = %e, "batch item failed");
                ItemReport::failure(e.quota())
            }
        }
    }

    async fn apply(&self, item: BatchItem) -> Result<Option<Quota>, SyncError> {
        match item {
            BatchItem::CreateProduct(product) => self.create_product(product).await,
            BatchItem::CreateVariant {
                product_id,
                shopify_product_id,
                variant,
            } => {
                self.create_variant(product_id, &shopify_product_id, variant)
                    .await
            }
            BatchItem::SyncInventory(record) => self.sync_inventory(record).await,
            BatchItem::SyncPrice(record) => self.sync_price(record).await,
            BatchItem::Fulfill(request) => self.fulfill(request).await,
            BatchItem::MarkPaid(request) => self.mark_paid(request).await,
        }
    }

    #[instrument(skip(self, product), fields(product_id = %product.product_info.product_id))]
    async fn create_product(&self, product: ProductPayload) -> Result<Option<Quota>, SyncError> {
        let product_id = product.product_info.product_id.clone();
        let created = self.admin.create_product(new_product(product)).await?;
        let variants = created.value.variants.iter().map(variant_link).collect();

        tracing::info!(
            shopify_product_id = %created.value.id,
            quota = ?created.quota.map(Quota::available),
            "product created"
        );

        self.notifier
            .deliver(Notification::SetProductId {
                product_id,
                shopify_product_id: created.value.id.into(),
                variants,
            })
            .await;

        Ok(created.quota)
    }

    #[instrument(skip(self, variant), fields(product_id = %product_id, shopify_product_id = %shopify_product_id))]
    async fn create_variant(
        &self,
        product_id: ExternalId,
        shopify_product_id: &ExternalId,
        variant: VariantPayload,
    ) -> Result<Option<Quota>, SyncError> {
        let product_gid = Gid::coerce(GidKind::Product, shopify_product_id);
        let created = self
            .admin
            .create_variant(&product_gid, new_variant(variant))
            .await?;

        tracing::info!(
            shopify_variant_id = %created.value.id,
            quota = ?created.quota.map(Quota::available),
            "variant created"
        );

        self.notifier
            .deliver(Notification::SetProductId {
                product_id,
                shopify_product_id: product_gid.into(),
                variants: vec![variant_link(&created.value)],
            })
            .await;

        Ok(created.quota)
    }

    #[instrument(skip(self, record), fields(shopify_variant_id = %record.shopify_variant_id))]
    async fn sync_inventory(&self, record: InventoryRecord) -> Result<Option<Quota>, SyncError> {
        let desired = record
            .quantity
            .ok_or_else(|| SyncError::Invalid("missing quantity".to_string()))?;
        let variant_id = Gid::coerce(GidKind::ProductVariant, &record.shopify_variant_id);

        let inventory = self.admin.variant_inventory(&variant_id).await?;
        let quota = inventory.quota;
        let snapshot = inventory.value.ok_or(SyncError::Missing {
            what: "variant",
            quota,
        })?;
        let level_id = snapshot.inventory_level_id.ok_or(SyncError::Missing {
            what: "inventory level",
            quota,
        })?;
        let current = snapshot.available.ok_or(SyncError::Missing {
            what: "inventory quantity",
            quota,
        })?;

        let delta = inventory_delta(desired, current);
        if delta == 0 {
            tracing::debug!(available = current, "inventory already in sync");
            return Ok(quota);
        }

        let adjusted = self.admin.adjust_inventory(&level_id, delta).await?;
        tracing::info!(
            delta,
            available = ?adjusted.value,
            quota = ?adjusted.quota.map(Quota::available),
            "inventory adjusted"
        );

        Ok(adjusted.quota.or(quota))
    }

    #[instrument(skip(self, record), fields(shopify_variant_id = %record.shopify_variant_id))]
    async fn sync_price(&self, record: PriceRecord) -> Result<Option<Quota>, SyncError> {
        let variant_id = Gid::coerce(GidKind::ProductVariant, &record.shopify_variant_id);
        let updated = self
            .admin
            .update_variant_price(&variant_id, record.price)
            .await?;

        tracing::info!(
            price = %record.price,
            quota = ?updated.quota.map(Quota::available),
            "price updated"
        );

        Ok(updated.quota)
    }

    #[instrument(skip(self, request), fields(shopify_order_id = %request.shopify_order_id, order_id = ?request.order_id))]
    async fn fulfill(&self, request: FulfillmentRequest) -> Result<Option<Quota>, SyncError> {
        let order_id = Gid::coerce(GidKind::Order, &request.shopify_order_id);

        let lookup = self.admin.first_fulfillment_order(&order_id).await?;
        let fulfillment_order_id = lookup.value.ok_or(SyncError::Missing {
            what: "fulfillment order",
            quota: lookup.quota,
        })?;

        let tracking = TrackingInfo {
            company: request.tracking_company,
            number: request.tracking_number,
            url: request.tracking_url,
        };
        let created = self
            .admin
            .create_fulfillment(&fulfillment_order_id, tracking)
            .await?;

        tracing::info!(
            fulfillment_id = %created.value,
            quota = ?created.quota.map(Quota::available),
            "order fulfilled"
        );

        Ok(created.quota.or(lookup.quota))
    }

    #[instrument(skip(self, request), fields(shopify_order_id = %request.shopify_order_id))]
    async fn mark_paid(&self, request: PaymentMarkRequest) -> Result<Option<Quota>, SyncError> {
        let order_id = Gid::coerce(GidKind::Order, &request.shopify_order_id);
        let paid = self.admin.mark_order_paid(&order_id).await?;

        tracing::info!(quota = ?paid.quota.map(Quota::available), "order marked as paid");

        Ok(paid.quota)
    }
}

fn new_product(product: ProductPayload) -> NewProduct {
    let images = product
        .product_info
        .image_sources()
        .map(str::to_string)
        .collect();
    let info = product.product_info;

    NewProduct {
        title: info.title,
        description_html: info.description,
        options: info.options,
        images,
        variants: product.variants.into_iter().map(new_variant).collect(),
    }
}

fn new_variant(variant: VariantPayload) -> NewVariant {
    NewVariant {
        title: variant.title,
        sku: variant.sku,
        price: variant.price,
        weight: variant.weight,
        options: variant.options,
        quantity: variant.quantity,
    }
}

fn variant_link(variant: &CreatedVariant) -> VariantLink {
    VariantLink {
        sku: variant.sku.clone(),
        shopify_variant_id: variant.id.clone().into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{DownstreamConfig, ShopifyConfig};

    fn products(value: serde_json::Value) -> Vec<ProductPayload> {
        serde_json::from_value(value).unwrap()
    }

    fn service(upstream: &MockServer, downstream: &MockServer) -> SyncService {
        let shopify = ShopifyConfig {
            shop_url: Url::parse(&upstream.uri()).unwrap(),
            api_version: "2021-10".to_string(),
            access_token: SecretString::from("shpat_test_token"),
            location_id: "3".to_string(),
            api_secret: SecretString::from("inbound-secret"),
        };
        let downstream = DownstreamConfig {
            base_url: Url::parse(&format!("{}/index.php", downstream.uri())).unwrap(),
        };

        SyncService::new(
            AdminClient::new(&shopify).unwrap(),
            Notifier::new(&downstream, upstream.uri()).unwrap(),
            BatchDispatcher::default(),
        )
    }

    fn inventory_response(quantity: i64) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "productVariant": {
                    "inventoryQuantity": quantity,
                    "inventoryItem": {
                        "id": "gid://shopify/InventoryItem/5",
                        "inventoryLevel": {"id": "gid://shopify/InventoryLevel/6?inventory_item_id=5"}
                    }
                }
            },
            "extensions": {"cost": {"throttleStatus": {"currentlyAvailable": 990}}}
        }))
    }

    #[test]
    fn test_inventory_delta_is_desired_minus_current() {
        assert_eq!(inventory_delta(5, 8), -3);
        assert_eq!(inventory_delta(8, 5), 3);
        assert_eq!(inventory_delta(4, 4), 0);
        assert_eq!(inventory_delta(i64::MIN, 1), i64::MIN);
    }

    #[test]
    fn test_batch_moduli() {
        assert_eq!(Batch::CreateProducts.modulus(), 50);
        assert_eq!(Batch::SyncInventory.modulus(), 10);
        assert_eq!(Batch::SyncPrice.modulus(), 10);
        assert_eq!(Batch::SetFulfillment.modulus(), 20);
        assert_eq!(Batch::SetPaid.modulus(), 20);
    }

    #[test]
    fn test_from_products_splits_new_products_and_new_variants() {
        let items = BatchItem::from_products(products(json!([
            {
                "product_info": {"product_id": 1, "title": "Mug"},
                "variants": [{"sku": "MUG-1"}, {"sku": "MUG-2"}]
            },
            {
                "product_info": {"product_id": 2, "shopify_product_id": "gid://shopify/Product/20", "title": "Cup"},
                "variants": [
                    {"sku": "CUP-1", "shopify_variant_id": "gid://shopify/ProductVariant/21"},
                    {"sku": "CUP-2"},
                    {"sku": "CUP-3", "shopify_variant_id": ""}
                ]
            }
        ])));

        let kinds: Vec<&str> = items.iter().map(BatchItem::kind).collect();
        assert_eq!(kinds, vec!["create_product", "create_variant", "create_variant"]);

        match &items[1] {
            BatchItem::CreateVariant {
                product_id,
                shopify_product_id,
                variant,
            } => {
                assert_eq!(*product_id, ExternalId::Number(2));
                assert_eq!(*shopify_product_id, ExternalId::from("gid://shopify/Product/20"));
                assert_eq!(variant.sku.as_deref(), Some("CUP-2"));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn test_new_product_keeps_only_real_images() {
        let product = products(json!([{
            "product_info": {
                "product_id": 1,
                "title": "Mug",
                "description": "<p>Red</p>",
                "options": ["Color"],
                "images": ["https://cdn.example.com/mug.jpg", null, ""]
            },
            "variants": [{"sku": "MUG-RED", "price": "12.50", "weight": "350g", "quantity": 4, "options": ["Red"]}]
        }]))
        .remove(0);

        let new = new_product(product);
        assert_eq!(new.title, "Mug");
        assert_eq!(new.description_html.as_deref(), Some("<p>Red</p>"));
        assert_eq!(new.images, vec!["https://cdn.example.com/mug.jpg".to_string()]);
        assert_eq!(new.variants[0].weight, Some(350));
        assert_eq!(new.variants[0].quantity, Some(4));
    }

    #[tokio::test]
    async fn test_sync_inventory_sends_negative_delta() {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"operationName": "getVariantInventory"})))
            .respond_with(inventory_response(8))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "operationName": "inventoryAdjustQuantity",
                "variables": {"input": {"availableDelta": -3}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"inventoryAdjustQuantity": {
                    "inventoryLevel": {"id": "gid://shopify/InventoryLevel/6", "available": 5},
                    "userErrors": []
                }},
                "extensions": {"cost": {"throttleStatus": {"currentlyAvailable": 980}}}
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let service = service(&upstream, &downstream);
        let report = service
            .process(BatchItem::SyncInventory(InventoryRecord {
                shopify_variant_id: ExternalId::Number(9),
                quantity: Some(5),
            }))
            .await;

        assert_eq!(report, ItemReport::success(Some(Quota::new(980))));
    }

    #[tokio::test]
    async fn test_sync_inventory_skips_zero_delta() {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"operationName": "getVariantInventory"})))
            .respond_with(inventory_response(5))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"operationName": "inventoryAdjustQuantity"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let service = service(&upstream, &downstream);
        let report = service
            .process(BatchItem::SyncInventory(InventoryRecord {
                shopify_variant_id: ExternalId::from("gid://shopify/ProductVariant/9"),
                quantity: Some(5),
            }))
            .await;

        assert_eq!(report, ItemReport::success(Some(Quota::new(990))));
    }

    #[tokio::test]
    async fn test_missing_variant_fails_with_quota() {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productVariant": null},
                "extensions": {"cost": {"throttleStatus": {"currentlyAvailable": 40}}}
            })))
            .mount(&upstream)
            .await;

        let service = service(&upstream, &downstream);
        let report = service
            .process(BatchItem::SyncInventory(InventoryRecord {
                shopify_variant_id: ExternalId::Number(9),
                quantity: Some(1),
            }))
            .await;

        assert_eq!(report, ItemReport::failure(Some(Quota::new(40))));
    }

    #[tokio::test]
    async fn test_create_variant_reports_product_gid_downstream() {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "operationName": "productVariantCreate",
                "variables": {"input": {
                    "productId": "gid://shopify/Product/20",
                    "sku": "CUP-2",
                    "inventoryItem": {"tracked": true},
                    "inventoryQuantities": [{"locationId": "gid://shopify/Location/3", "availableQuantity": 7}]
                }}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productVariantCreate": {
                    "product": {"id": "gid://shopify/Product/20"},
                    "productVariant": {"id": "gid://shopify/ProductVariant/22", "sku": "CUP-2"},
                    "userErrors": []
                }}
            })))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "product_id": 2,
                "shopify_product_id": "gid://shopify/Product/20",
                "variants": [{"sku": "CUP-2", "shopify_variant_id": "gid://shopify/ProductVariant/22"}]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&downstream)
            .await;

        let service = service(&upstream, &downstream);
        let variant: VariantPayload =
            serde_json::from_value(json!({"sku": "CUP-2", "quantity": "7"})).unwrap();
        let report = service
            .process(BatchItem::CreateVariant {
                product_id: ExternalId::Number(2),
                shopify_product_id: ExternalId::Number(20),
                variant,
            })
            .await;

        assert!(report.succeeded);
    }

    #[tokio::test]
    async fn test_user_errors_fail_the_item() {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"orderMarkAsPaid": {
                    "order": null,
                    "userErrors": [{"field": ["id"], "message": "Order is already paid"}]
                }},
                "extensions": {"cost": {"throttleStatus": {"currentlyAvailable": 10}}}
            })))
            .mount(&upstream)
            .await;

        let service = service(&upstream, &downstream);
        let report = service
            .process(BatchItem::MarkPaid(PaymentMarkRequest {
                shopify_order_id: ExternalId::Number(450_789_469),
            }))
            .await;

        // The rejected mutation still reported its cost.
        assert_eq!(report, ItemReport::failure(Some(Quota::new(10))));
    }

    #[tokio::test]
    async fn test_null_mutation_payload_fails_the_item() {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productVariantUpdate": null},
                "errors": [{"message": "Access denied for productVariantUpdate field."}],
                "extensions": {"cost": {"throttleStatus": {"currentlyAvailable": 20}}}
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let service = service(&upstream, &downstream);
        let report = service
            .process(BatchItem::SyncPrice(PriceRecord {
                shopify_variant_id: ExternalId::Number(9),
                price: rust_decimal::Decimal::new(1999, 2),
            }))
            .await;

        assert_eq!(report, ItemReport::failure(Some(Quota::new(20))));
    }

    #[tokio::test]
    async fn test_untracked_quantity_fails_without_adjusting() {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"operationName": "getVariantInventory"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productVariant": {
                    "inventoryQuantity": null,
                    "inventoryItem": {
                        "id": "gid://shopify/InventoryItem/5",
                        "inventoryLevel": {"id": "gid://shopify/InventoryLevel/6"}
                    }
                }},
                "extensions": {"cost": {"throttleStatus": {"currentlyAvailable": 990}}}
            })))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"operationName": "inventoryAdjustQuantity"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let service = service(&upstream, &downstream);
        let report = service
            .process(BatchItem::SyncInventory(InventoryRecord {
                shopify_variant_id: ExternalId::Number(9),
                quantity: Some(4),
            }))
            .await;

        assert_eq!(report, ItemReport::failure(Some(Quota::new(990))));
    }
}
