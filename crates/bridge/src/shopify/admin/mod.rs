//! Shopify Admin API GraphQL client.
//!
//! Authenticates with a private-app access token sent as
//! `X-Shopify-Access-Token`. Every call returns the value together with the
//! quota Shopify reported for it, so callers can pace their next request.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::GraphQLQuery;
use inflyshop_bridge_core::{Gid, GidKind};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};

use crate::config::ShopifyConfig;

use super::{GraphQLError, GraphQLErrorLocation, Quota, ResponseExtensions, ShopifyError};

mod inventory;
mod orders;
mod products;
pub mod queries;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const THROTTLED_CODE: &str = "THROTTLED";

/// A response value together with the quota reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metered<T> {
    pub value: T,
    /// Remaining cost points, `None` when the response carried no cost data.
    pub quota: Option<Quota>,
}

impl<T> Metered<T> {
    /// Transform the value, keeping the quota.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metered<U> {
        Metered {
            value: f(self.value),
            quota: self.quota,
        }
    }
}

/// A product to create, with its initial variants.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub title: String,
    pub description_html: Option<String>,
    pub options: Vec<String>,
    /// Image URLs.
    pub images: Vec<String>,
    pub variants: Vec<NewVariant>,
}

/// A variant to create.
#[derive(Debug, Clone, Default)]
pub struct NewVariant {
    pub title: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub weight: Option<i64>,
    pub options: Vec<String>,
    /// Initial stock at the configured location.
    pub quantity: Option<i64>,
}

/// A product returned by `productCreate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub id: Gid,
    pub variants: Vec<CreatedVariant>,
}

/// A variant returned by `productCreate` or `productVariantCreate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedVariant {
    pub id: Gid,
    pub sku: Option<String>,
}

/// Stock of a variant at the configured location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    /// Quantity Shopify currently reports for the variant, `None` when the
    /// variant's inventory is not tracked.
    pub available: Option<i64>,
    /// Inventory level at the configured location, `None` when the variant
    /// is not stocked there.
    pub inventory_level_id: Option<Gid>,
}

/// Tracking details attached to a fulfillment.
#[derive(Debug, Clone, Default)]
pub struct TrackingInfo {
    pub company: Option<String>,
    pub number: Option<String>,
    pub url: Option<String>,
}

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    location: Gid,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("endpoint", &self.inner.endpoint)
            .field("access_token", &"[REDACTED]")
            .field("location", &self.inner.location)
            .finish()
    }
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
    extensions: Option<ResponseExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorExtensions {
    code: Option<String>,
}

impl GraphQLErrorResponse {
    fn is_throttled(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == THROTTLED_CODE)
    }
}

impl From<GraphQLErrorResponse> for GraphQLError {
    fn from(e: GraphQLErrorResponse) -> Self {
        Self {
            message: e.message,
            locations: e
                .locations
                .into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: l.line,
                    column: l.column,
                })
                .collect(),
            path: e.path,
        }
    }
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                endpoint: config.graphql_endpoint(),
                access_token: config.access_token.clone(),
                location: Gid::coerce(GidKind::Location, &config.location_id),
            }),
        })
    }

    /// The GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// The location inventory is read from and written to.
    #[must_use]
    pub fn location(&self) -> &Gid {
        &self.inner.location
    }

    /// Execute a GraphQL operation.
    ///
    /// Field-level errors that come with data are logged and the data is
    /// returned. Errors without data fail the call.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Metered<Q::ResponseData>, ShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(1, whole_seconds);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized(
                "Invalid or revoked access token".to_string(),
            ));
        }

        let bytes = response.error_for_status()?.bytes().await?;
        let graphql_response: GraphQLResponse<Q::ResponseData> = serde_json::from_slice(&bytes)?;

        let quota = graphql_response
            .extensions
            .as_ref()
            .and_then(ResponseExtensions::quota);
        let errors = graphql_response.errors.unwrap_or_default();
        let throttled = errors.iter().any(GraphQLErrorResponse::is_throttled);
        let errors: Vec<GraphQLError> = errors.into_iter().map(GraphQLError::from).collect();

        match graphql_response.data {
            Some(data) => {
                if !errors.is_empty() {
                    tracing::warn!(
                        operation = body.operation_name,
                        errors = %super::format_graphql_errors(&errors),
                        "GraphQL errors in response"
                    );
                }
                Ok(Metered { value: data, quota })
            }
            None if throttled => Err(ShopifyError::Throttled(quota)),
            None if errors.is_empty() => Err(ShopifyError::GraphQL {
                errors: vec![GraphQLError {
                    message: "No data in response".to_string(),
                    locations: vec![],
                    path: vec![],
                }],
                quota,
            }),
            None => Err(ShopifyError::GraphQL { errors, quota }),
        }
    }
}

/// Fail with `ShopifyError::UserError` when a mutation reported user errors.
fn check_user_errors(
    errors: &[queries::UserError],
    quota: Option<Quota>,
) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ShopifyError::UserError {
            message: queries::format_user_errors(errors),
            quota,
        })
    }
}

/// Fail with `ShopifyError::NotFound` when a response field came back null.
fn required<T>(value: Option<T>, what: &str, quota: Option<Quota>) -> Result<T, ShopifyError> {
    value.ok_or_else(|| ShopifyError::NotFound {
        what: what.to_string(),
        quota,
    })
}

/// Round a `Retry-After` value (Shopify sends e.g. `2.0`) up to whole seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped first
fn whole_seconds(secs: f64) -> u64 {
    if secs.is_finite() {
        secs.ceil().clamp(0.0, 3600.0) as u64
    } else {
        1
    }
}
