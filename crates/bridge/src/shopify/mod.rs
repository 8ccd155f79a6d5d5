//! Shopify Admin API client.
//!
//! # Security
//!
//! This module holds the Shopify Admin API access token. The bridge only uses
//! it for the handful of operations the order-management system needs:
//! - Products and variants (create, price updates)
//! - Inventory levels at a single location
//! - Fulfillments and payment status of orders
//!
//! # Architecture
//!
//! - Uses `graphql_client`'s `GraphQLQuery` trait with hand-written documents
//! - Direct API calls to Shopify (no local state)
//! - Every response reports the remaining query cost budget as a [`Quota`]
//!
//! # Example
//!
//! ```rust,ignore
//! use inflyshop_bridge::shopify::AdminClient;
//!
//! let client = AdminClient::new(&config.shopify)?;
//!
//! let paid = client.mark_order_paid(&Gid::new(GidKind::Order, 450_789_469)).await?;
//! tracing::info!(quota = ?paid.quota, "order marked as paid");
//! ```

mod admin;

pub use admin::{
    AdminClient, CreatedProduct, CreatedVariant, InventorySnapshot, Metered, NewProduct,
    NewVariant, TrackingInfo,
};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors and no data.
    #[error("GraphQL errors: {}", format_graphql_errors(errors))]
    GraphQL {
        errors: Vec<GraphQLError>,
        quota: Option<Quota>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {what}")]
    NotFound { what: String, quota: Option<Quota> },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Query rejected because the cost budget is exhausted.
    #[error("Throttled by Shopify ({} points available)", format_quota(.0.as_ref()))]
    Throttled(Option<Quota>),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {message}")]
    UserError {
        message: String,
        quota: Option<Quota>,
    },
}

impl ShopifyError {
    /// Quota reported alongside the failure, if Shopify sent one.
    ///
    /// Transport failures never carry one.
    #[must_use]
    pub const fn quota(&self) -> Option<Quota> {
        match self {
            Self::Throttled(quota)
            | Self::GraphQL { quota, .. }
            | Self::NotFound { quota, .. }
            | Self::UserError { quota, .. } => *quota,
            Self::Http(_) | Self::Parse(_) | Self::RateLimited(_) | Self::Unauthorized(_) => None,
        }
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_quota(quota: Option<&Quota>) -> String {
    quota.map_or_else(|| "unknown".to_string(), ToString::to_string)
}

/// Remaining query cost points reported by Shopify.
///
/// Read from `extensions.cost.throttleStatus.currentlyAvailable` of each
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quota(u32);

impl Quota {
    /// Create a quota from a number of available points.
    #[must_use]
    pub const fn new(available: u32) -> Self {
        Self(available)
    }

    /// Available cost points.
    #[must_use]
    pub const fn available(self) -> u32 {
        self.0
    }

    /// Convert the floating point value Shopify reports, clamping to `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped first
    pub fn from_reported(available: f64) -> Option<Self> {
        available
            .is_finite()
            .then(|| Self(available.clamp(0.0, f64::from(u32::MAX)) as u32))
    }
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `extensions` block of an Admin API response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResponseExtensions {
    cost: Option<QueryCost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryCost {
    throttle_status: Option<ThrottleStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThrottleStatus {
    currently_available: Option<f64>,
}

impl ResponseExtensions {
    /// The quota reported in this response, if any.
    pub(crate) fn quota(&self) -> Option<Quota> {
        self.cost
            .as_ref()?
            .throttle_status
            .as_ref()?
            .currently_available
            .and_then(Quota::from_reported)
    }
}
