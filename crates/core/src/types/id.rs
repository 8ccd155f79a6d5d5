//! Identifier types for both sides of the bridge.
//!
//! The order-management system sends its own ids as either JSON strings or
//! JSON numbers, and expects them back in the same shape. Shopify ids are
//! global ids (`gid://shopify/<Type>/<id>`), but some callers send only the
//! numeric tail.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every Shopify global id.
pub const GID_PREFIX: &str = "gid://shopify/";

/// An id owned by the external order-management system.
///
/// Deserializes from a JSON string or integer and serializes back in the
/// shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    /// Integer id (e.g. `42`).
    Number(i64),
    /// String id (e.g. `"42"` or `"gid://shopify/Product/1"`).
    Text(String),
}

impl ExternalId {
    /// Returns `true` for values the caller uses to mean "no id yet":
    /// an empty string or zero.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(n) => *n == 0,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ExternalId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for ExternalId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<Gid> for ExternalId {
    fn from(id: Gid) -> Self {
        Self::Text(id.into_inner())
    }
}

/// Shopify resource types the bridge builds global ids for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GidKind {
    Product,
    ProductVariant,
    Order,
    Location,
}

impl GidKind {
    /// The resource name used inside the global id.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::ProductVariant => "ProductVariant",
            Self::Order => "Order",
            Self::Location => "Location",
        }
    }
}

/// A Shopify global id, e.g. `gid://shopify/Order/450789469`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gid(String);

impl Gid {
    /// Build a global id from a resource kind and its numeric tail.
    #[must_use]
    pub fn new(kind: GidKind, id: impl fmt::Display) -> Self {
        Self(format!("{GID_PREFIX}{}/{id}", kind.as_str()))
    }

    /// Use `raw` as-is when it already is a global id, otherwise treat it as
    /// the numeric tail of a `kind` id.
    #[must_use]
    pub fn coerce(kind: GidKind, raw: impl fmt::Display) -> Self {
        let raw = raw.to_string();
        let raw = raw.trim();
        if raw.starts_with(GID_PREFIX) {
            Self(raw.to_string())
        } else {
            Self::new(kind, raw)
        }
    }

    /// Wrap a value returned by Shopify.
    #[must_use]
    pub fn from_upstream(raw: String) -> Self {
        Self(raw)
    }

    /// Get the global id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Gid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_external_id_keeps_json_shape() {
        let number: ExternalId = serde_json::from_str("42").unwrap();
        let text: ExternalId = serde_json::from_str("\"42\"").unwrap();

        assert_eq!(number, ExternalId::Number(42));
        assert_eq!(text, ExternalId::Text("42".to_string()));
        assert_eq!(serde_json::to_string(&number).unwrap(), "42");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"42\"");
    }

    #[test]
    fn test_external_id_blank() {
        assert!(ExternalId::Number(0).is_blank());
        assert!(ExternalId::from("  ").is_blank());
        assert!(!ExternalId::Number(7).is_blank());
        assert!(!ExternalId::from("gid://shopify/Product/1").is_blank());
    }

    #[test]
    fn test_gid_new() {
        let gid = Gid::new(GidKind::Location, 61_234);
        assert_eq!(gid.as_str(), "gid://shopify/Location/61234");
    }

    #[test]
    fn test_gid_coerce_numeric_tail() {
        let gid = Gid::coerce(GidKind::Order, ExternalId::Number(450_789_469));
        assert_eq!(gid.to_string(), "gid://shopify/Order/450789469");
    }

    #[test]
    fn test_gid_coerce_keeps_existing_gid() {
        let gid = Gid::coerce(GidKind::Order, "gid://shopify/Order/1 ");
        assert_eq!(gid.as_str(), "gid://shopify/Order/1");
    }

    #[test]
    fn test_gid_serializes_transparently() {
        let gid = Gid::new(GidKind::Product, 1);
        assert_eq!(
            serde_json::to_string(&gid).unwrap(),
            "\"gid://shopify/Product/1\""
        );
    }

    #[test]
    fn test_external_id_from_gid() {
        let id = ExternalId::from(Gid::new(GidKind::ProductVariant, 9));
        assert_eq!(id, ExternalId::from("gid://shopify/ProductVariant/9"));
    }
}
