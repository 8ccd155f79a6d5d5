//! Inventory operations for the Admin API.

use inflyshop_bridge_core::Gid;
use tracing::instrument;

use super::{
    AdminClient, InventorySnapshot, Metered, ShopifyError, check_user_errors, required,
    queries::{GetVariantInventory, InventoryAdjustQuantity},
};

impl AdminClient {
    /// Read a variant's quantity and its inventory level at the configured
    /// location.
    ///
    /// Returns `None` when the variant does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn variant_inventory(
        &self,
        variant_id: &Gid,
    ) -> Result<Metered<Option<InventorySnapshot>>, ShopifyError> {
        use super::queries::get_variant_inventory::Variables;

        let variables = Variables {
            id: variant_id.to_string(),
            location_id: self.location().to_string(),
        };

        let response = self.execute::<GetVariantInventory>(variables).await?;

        Ok(response.map(|data| {
            data.product_variant.map(|variant| InventorySnapshot {
                available: variant.inventory_quantity,
                inventory_level_id: variant
                    .inventory_item
                    .inventory_level
                    .map(|level| Gid::from_upstream(level.id)),
            })
        }))
    }

    /// Apply a signed delta to the available quantity of an inventory level.
    ///
    /// Returns the new available quantity when Shopify reports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, the mutation reports user
    /// errors, or no payload comes back.
    #[instrument(skip(self), fields(inventory_level_id = %inventory_level_id))]
    pub async fn adjust_inventory(
        &self,
        inventory_level_id: &Gid,
        delta: i64,
    ) -> Result<Metered<Option<i64>>, ShopifyError> {
        use super::queries::inventory_adjust_quantity::{InventoryAdjustQuantityInput, Variables};

        let variables = Variables {
            input: InventoryAdjustQuantityInput {
                inventory_level_id: inventory_level_id.to_string(),
                available_delta: delta,
            },
        };

        let response = self.execute::<InventoryAdjustQuantity>(variables).await?;
        let quota = response.quota;

        let payload = required(
            response.value.inventory_adjust_quantity,
            "inventoryAdjustQuantity payload",
            quota,
        )?;
        check_user_errors(&payload.user_errors, quota)?;
        let available = payload.inventory_level.and_then(|level| level.available);

        Ok(Metered {
            value: available,
            quota,
        })
    }
}
