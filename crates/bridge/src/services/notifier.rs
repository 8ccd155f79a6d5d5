//! REST client for the order-management system's callback endpoint.
//!
//! Every notification is a JSON `POST` to
//! `<base>?route=<route>&cron=true`. Delivery is best effort: failures are
//! logged and never retried.

use std::sync::Arc;
use std::time::Duration;

use inflyshop_bridge_core::{ExternalId, VariantLink};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::DownstreamConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when calling the downstream endpoint.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// An event reported to the order-management system.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Shopify ids assigned to a newly created product or variant.
    SetProductId {
        product_id: ExternalId,
        shopify_product_id: ExternalId,
        variants: Vec<VariantLink>,
    },
    /// Variants of a product changed in Shopify.
    ProductUpdate {
        shopify_product_id: ExternalId,
        variants: Vec<VariantLink>,
    },
    /// A product was deleted in Shopify.
    ProductDelete { shopify_product_id: ExternalId },
    /// A new order, forwarded verbatim.
    OrderCreation(Value),
}

impl Notification {
    /// Value of the `route` query parameter.
    #[must_use]
    pub const fn route(&self) -> &'static str {
        match self {
            Self::SetProductId { .. } => "shopify/product/set_product_id",
            Self::ProductUpdate { .. } => "shopify/product/product_update",
            Self::ProductDelete { .. } => "shopify/product/product_delete",
            Self::OrderCreation(_) => "shopify/order",
        }
    }

    /// JSON body sent for this event.
    #[must_use]
    pub fn payload(&self, shop: &str) -> Value {
        match self {
            Self::SetProductId {
                product_id,
                shopify_product_id,
                variants,
            } => json!({
                "shop": shop,
                "product_id": product_id,
                "shopify_product_id": shopify_product_id,
                "variants": variants,
            }),
            Self::ProductUpdate {
                shopify_product_id,
                variants,
            } => json!({
                "shop": shop,
                "shopify_product_id": shopify_product_id,
                "variants": variants,
            }),
            Self::ProductDelete { shopify_product_id } => json!({
                "shop": shop,
                "shopify_product_id": shopify_product_id,
            }),
            Self::OrderCreation(data) => json!({ "data": data }),
        }
    }
}

/// Downstream notification client.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    client: reqwest::Client,
    base_url: Url,
    shop: String,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("base_url", &self.inner.base_url.as_str())
            .field("shop", &self.inner.shop)
            .finish()
    }
}

impl Notifier {
    /// Create a notifier reporting on behalf of `shop`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &DownstreamConfig, shop: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(NotifierInner {
                client,
                base_url: config.base_url.clone(),
                shop: shop.into(),
            }),
        })
    }

    /// The shop identifier included in payloads.
    #[must_use]
    pub fn shop(&self) -> &str {
        &self.inner.shop
    }

    /// URL a notification is posted to.
    #[must_use]
    pub fn endpoint(&self, route: &str) -> Url {
        let mut url = self.inner.base_url.clone();
        url.set_query(Some(&format!("route={route}&cron=true")));
        url
    }

    /// Post a notification.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip(self, notification), fields(route = notification.route()))]
    pub async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(notification.route()))
            .json(&notification.payload(&self.inner.shop))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(status = status.as_u16(), "notification delivered");
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(NotifyError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Post a notification, logging any failure.
    pub async fn deliver(&self, notification: Notification) {
        if let Err(e) = self.notify(&notification).await {
            tracing::error!(route = notification.route(), error = %e, "notification failed");
        }
    }

    /// Post a notification in the background.
    pub fn notify_detached(&self, notification: Notification) {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.deliver(notification).await });
    }
}
