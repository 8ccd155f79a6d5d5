//! GraphQL documents for the Shopify Admin API.
//!
//! Each operation is a unit struct implementing `graphql_client::GraphQLQuery`
//! with its variables and response types in a snake_case module of the same
//! name, the layout `graphql_client` codegen produces.

use graphql_client::{GraphQLQuery, QueryBody};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Declare an operation struct bound to a document and its types module.
macro_rules! operation {
    ($(#[$meta:meta])* $name:ident, $module:ident, $operation_name:literal, $document:expr) => {
        $(#[$meta])*
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: $operation_name,
                }
            }
        }
    };
}

// =============================================================================
// Shared types
// =============================================================================

/// Mutation user error.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Join user errors into a single message (`field.path: message; ...`).
pub fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| {
            let field = e.field.as_ref().map_or_else(String::new, |f| f.join("."));
            if field.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", field, e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Relay-style connection.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    /// Consume the connection, yielding its nodes in order.
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|edge| edge.node)
    }
}

/// `{id, sku}` of a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantRef {
    pub id: String,
    pub sku: Option<String>,
}

/// Variant input shared by `productCreate` and `productVariantCreate`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_item: Option<InventoryItemInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inventory_quantities: Vec<InventoryLevelInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryItemInput {
    pub tracked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevelInput {
    pub location_id: String,
    pub available_quantity: i64,
}

// =============================================================================
// Product mutations
// =============================================================================

const PRODUCT_CREATE: &str = r"
mutation productCreate($input: ProductInput!) {
  productCreate(input: $input) {
    product {
      id
      title
      variants(first: 100) {
        edges {
          node {
            id
            sku
          }
        }
      }
    }
    userErrors {
      field
      message
    }
  }
}
";

operation!(
    /// Create a product together with its variants.
    ProductCreate,
    product_create,
    "productCreate",
    PRODUCT_CREATE
);

pub mod product_create {
    use super::{Connection, Deserialize, Serialize, UserError, VariantRef};

    pub use super::{InventoryItemInput, InventoryLevelInput, ProductVariantInput};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: ProductInput,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductInput {
        pub title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description_html: Option<String>,
        pub published: bool,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub options: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub images: Vec<ImageInput>,
        pub variants: Vec<ProductVariantInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct ImageInput {
        pub src: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub product: Option<Product>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Product {
        pub id: String,
        pub title: Option<String>,
        pub variants: Connection<VariantRef>,
    }
}

const PRODUCT_VARIANT_CREATE: &str = r"
mutation productVariantCreate($input: ProductVariantInput!) {
  productVariantCreate(input: $input) {
    product {
      id
    }
    productVariant {
      id
      sku
    }
    userErrors {
      field
      message
    }
  }
}
";

operation!(
    /// Add a variant to an existing product.
    ProductVariantCreate,
    product_variant_create,
    "productVariantCreate",
    PRODUCT_VARIANT_CREATE
);

pub mod product_variant_create {
    use super::{Deserialize, Serialize, UserError, VariantRef};

    pub use super::ProductVariantInput;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: ProductVariantInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_variant_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub product: Option<ProductRef>,
        pub product_variant: Option<VariantRef>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductRef {
        pub id: String,
    }
}

const PRODUCT_VARIANT_UPDATE: &str = r"
mutation productVariantUpdate($input: ProductVariantInput!) {
  productVariantUpdate(input: $input) {
    productVariant {
      id
      price
    }
    userErrors {
      field
      message
    }
  }
}
";

operation!(
    /// Update a variant (used for price changes).
    ProductVariantUpdate,
    product_variant_update,
    "productVariantUpdate",
    PRODUCT_VARIANT_UPDATE
);

pub mod product_variant_update {
    use super::{Deserialize, Serialize, UserError};

    pub use super::ProductVariantInput;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: ProductVariantInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_variant_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub product_variant: Option<Variant>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Variant {
        pub id: String,
        pub price: Option<String>,
    }
}

// =============================================================================
// Inventory
// =============================================================================

const GET_VARIANT_INVENTORY: &str = r"
query getVariantInventory($id: ID!, $locationId: ID!) {
  productVariant(id: $id) {
    inventoryQuantity
    inventoryItem {
      id
      inventoryLevel(locationId: $locationId) {
        id
      }
    }
  }
}
";

operation!(
    /// Current quantity of a variant and its inventory level at a location.
    GetVariantInventory,
    get_variant_inventory,
    "getVariantInventory",
    GET_VARIANT_INVENTORY
);

pub mod get_variant_inventory {
    use super::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub id: String,
        pub location_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_variant: Option<ProductVariant>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductVariant {
        pub inventory_quantity: Option<i64>,
        pub inventory_item: InventoryItem,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InventoryItem {
        pub id: String,
        pub inventory_level: Option<InventoryLevel>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct InventoryLevel {
        pub id: String,
    }
}

const INVENTORY_ADJUST_QUANTITY: &str = r"
mutation inventoryAdjustQuantity($input: InventoryAdjustQuantityInput!) {
  inventoryAdjustQuantity(input: $input) {
    inventoryLevel {
      id
      available
    }
    userErrors {
      field
      message
    }
  }
}
";

operation!(
    /// Apply a signed delta to the available quantity of an inventory level.
    InventoryAdjustQuantity,
    inventory_adjust_quantity,
    "inventoryAdjustQuantity",
    INVENTORY_ADJUST_QUANTITY
);

pub mod inventory_adjust_quantity {
    use super::{Deserialize, Serialize, UserError};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: InventoryAdjustQuantityInput,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InventoryAdjustQuantityInput {
        pub inventory_level_id: String,
        pub available_delta: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub inventory_adjust_quantity: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub inventory_level: Option<InventoryLevel>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct InventoryLevel {
        pub id: String,
        pub available: Option<i64>,
    }
}

// =============================================================================
// Orders
// =============================================================================

const GET_FULFILLMENT_ORDERS: &str = r"
query getFulfillmentOrders($id: ID!) {
  order(id: $id) {
    fulfillmentOrders(first: 1) {
      edges {
        node {
          id
        }
      }
    }
  }
}
";

operation!(
    /// First fulfillment order of an order.
    GetFulfillmentOrders,
    get_fulfillment_orders,
    "getFulfillmentOrders",
    GET_FULFILLMENT_ORDERS
);

pub mod get_fulfillment_orders {
    use super::{Connection, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub order: Option<Order>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Order {
        pub fulfillment_orders: Connection<FulfillmentOrder>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct FulfillmentOrder {
        pub id: String,
    }
}

const FULFILLMENT_CREATE_V2: &str = r"
mutation fulfillmentCreateV2($fulfillment: FulfillmentV2Input!) {
  fulfillmentCreateV2(fulfillment: $fulfillment) {
    fulfillment {
      id
      status
      trackingInfo {
        company
        number
        url
      }
    }
    userErrors {
      field
      message
    }
  }
}
";

operation!(
    /// Fulfill a fulfillment order with tracking information.
    FulfillmentCreateV2,
    fulfillment_create_v2,
    "fulfillmentCreateV2",
    FULFILLMENT_CREATE_V2
);

pub mod fulfillment_create_v2 {
    use super::{Deserialize, Serialize, UserError};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub fulfillment: FulfillmentV2Input,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FulfillmentV2Input {
        pub notify_customer: bool,
        pub tracking_info: FulfillmentTrackingInput,
        pub line_items_by_fulfillment_order: Vec<FulfillmentOrderLineItemsInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct FulfillmentTrackingInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub company: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub number: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub url: Option<String>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FulfillmentOrderLineItemsInput {
        pub fulfillment_order_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub fulfillment_create_v2: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub fulfillment: Option<Fulfillment>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Fulfillment {
        pub id: String,
        pub status: Option<String>,
    }
}

const ORDER_MARK_AS_PAID: &str = r"
mutation orderMarkAsPaid($input: OrderMarkAsPaidInput!) {
  orderMarkAsPaid(input: $input) {
    order {
      id
    }
    userErrors {
      field
      message
    }
  }
}
";

operation!(
    /// Mark an order as paid.
    OrderMarkAsPaid,
    order_mark_as_paid,
    "orderMarkAsPaid",
    ORDER_MARK_AS_PAID
);

pub mod order_mark_as_paid {
    use super::{Deserialize, Serialize, UserError};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: OrderMarkAsPaidInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct OrderMarkAsPaidInput {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub order_mark_as_paid: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub order: Option<OrderRef>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OrderRef {
        pub id: String,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_query_sets_operation_name() {
        let body = OrderMarkAsPaid::build_query(order_mark_as_paid::Variables {
            input: order_mark_as_paid::OrderMarkAsPaidInput {
                id: "gid://shopify/Order/1".to_string(),
            },
        });

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["operationName"], "orderMarkAsPaid");
        assert_eq!(value["variables"]["input"]["id"], "gid://shopify/Order/1");
        assert!(value["query"].as_str().unwrap().contains("orderMarkAsPaid(input: $input)"));
    }

    #[test]
    fn test_variant_input_skips_unset_fields() {
        let input = ProductVariantInput {
            id: Some("gid://shopify/ProductVariant/9".to_string()),
            price: Some(Decimal::new(1999, 2)),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"id": "gid://shopify/ProductVariant/9", "price": "19.99"})
        );
    }

    #[test]
    fn test_inventory_variables_are_camel_case() {
        let variables = get_variant_inventory::Variables {
            id: "gid://shopify/ProductVariant/9".to_string(),
            location_id: "gid://shopify/Location/3".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&variables).unwrap(),
            json!({"id": "gid://shopify/ProductVariant/9", "locationId": "gid://shopify/Location/3"})
        );
    }

    #[test]
    fn test_format_user_errors() {
        let errors = vec![
            UserError {
                field: Some(vec!["input".to_string(), "sku".to_string()]),
                message: "has already been taken".to_string(),
            },
            UserError {
                field: None,
                message: "Order is already paid".to_string(),
            },
        ];

        assert_eq!(
            format_user_errors(&errors),
            "input.sku: has already been taken; Order is already paid"
        );
    }

    #[test]
    fn test_product_create_response_parses() {
        let data: product_create::ResponseData = serde_json::from_value(json!({
            "productCreate": {
                "product": {
                    "id": "gid://shopify/Product/1",
                    "title": "Mug",
                    "variants": {"edges": [{"node": {"id": "gid://shopify/ProductVariant/2", "sku": "MUG"}}]}
                },
                "userErrors": []
            }
        }))
        .unwrap();

        let product = data.product_create.unwrap().product.unwrap();
        let variants: Vec<VariantRef> = product.variants.into_nodes().collect();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].sku.as_deref(), Some("MUG"));
    }
}
