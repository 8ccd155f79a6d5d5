//! Product and variant mutations for the Admin API.

use inflyshop_bridge_core::Gid;
use rust_decimal::Decimal;
use tracing::instrument;

use super::{
    AdminClient, CreatedProduct, CreatedVariant, Metered, NewProduct, NewVariant, ShopifyError,
    check_user_errors, required,
    queries::{
        InventoryItemInput, InventoryLevelInput, ProductCreate, ProductVariantCreate,
        ProductVariantInput, ProductVariantUpdate, VariantRef,
    },
};

impl AdminClient {
    /// Create a product with its variants.
    ///
    /// Products are created unpublished. Every variant is tracked and, when a
    /// quantity is given, stocked at the configured location.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, the mutation reports user
    /// errors, or no product comes back.
    #[instrument(skip(self, product), fields(title = %product.title, variants = product.variants.len()))]
    pub async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<Metered<CreatedProduct>, ShopifyError> {
        use super::queries::product_create::{ImageInput, ProductInput, Variables};

        let variants = product
            .variants
            .into_iter()
            .map(|variant| self.variant_input(variant))
            .collect();

        let variables = Variables {
            input: ProductInput {
                title: product.title,
                description_html: product.description_html,
                published: false,
                options: product.options,
                images: product
                    .images
                    .into_iter()
                    .map(|src| ImageInput { src })
                    .collect(),
                variants,
            },
        };

        let response = self.execute::<ProductCreate>(variables).await?;
        let quota = response.quota;

        let payload = required(response.value.product_create, "productCreate payload", quota)?;
        check_user_errors(&payload.user_errors, quota)?;
        let product = required(payload.product, "created product", quota)?;

        Ok(Metered {
            value: CreatedProduct {
                id: Gid::from_upstream(product.id),
                variants: product.variants.into_nodes().map(created_variant).collect(),
            },
            quota,
        })
    }

    /// Add a variant to an existing product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, the mutation reports user
    /// errors, or no variant comes back.
    #[instrument(skip(self, variant), fields(product_id = %product_id, sku = ?variant.sku))]
    pub async fn create_variant(
        &self,
        product_id: &Gid,
        variant: NewVariant,
    ) -> Result<Metered<CreatedVariant>, ShopifyError> {
        use super::queries::product_variant_create::Variables;

        let variables = Variables {
            input: ProductVariantInput {
                product_id: Some(product_id.to_string()),
                ..self.variant_input(variant)
            },
        };

        let response = self.execute::<ProductVariantCreate>(variables).await?;
        let quota = response.quota;

        let payload = required(
            response.value.product_variant_create,
            "productVariantCreate payload",
            quota,
        )?;
        check_user_errors(&payload.user_errors, quota)?;
        let variant = required(payload.product_variant, "created variant", quota)?;

        Ok(Metered {
            value: created_variant(variant),
            quota,
        })
    }

    /// Set the price of a variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, the mutation reports user
    /// errors, or no payload comes back.
    #[instrument(skip(self), fields(variant_id = %variant_id, price = %price))]
    pub async fn update_variant_price(
        &self,
        variant_id: &Gid,
        price: Decimal,
    ) -> Result<Metered<()>, ShopifyError> {
        use super::queries::product_variant_update::Variables;

        let variables = Variables {
            input: ProductVariantInput {
                id: Some(variant_id.to_string()),
                price: Some(price),
                ..ProductVariantInput::default()
            },
        };

        let response = self.execute::<ProductVariantUpdate>(variables).await?;
        let quota = response.quota;

        let payload = required(
            response.value.product_variant_update,
            "productVariantUpdate payload",
            quota,
        )?;
        check_user_errors(&payload.user_errors, quota)?;

        Ok(Metered { value: (), quota })
    }

    fn variant_input(&self, variant: NewVariant) -> ProductVariantInput {
        let inventory_quantities = variant
            .quantity
            .map(|available_quantity| InventoryLevelInput {
                location_id: self.location().to_string(),
                available_quantity,
            })
            .into_iter()
            .collect();

        ProductVariantInput {
            title: variant.title,
            sku: variant.sku,
            price: variant.price,
            weight: variant.weight,
            options: variant.options,
            inventory_item: Some(InventoryItemInput { tracked: true }),
            inventory_quantities,
            ..ProductVariantInput::default()
        }
    }
}

fn created_variant(variant: VariantRef) -> CreatedVariant {
    CreatedVariant {
        id: Gid::from_upstream(variant.id),
        sku: variant.sku,
    }
}
