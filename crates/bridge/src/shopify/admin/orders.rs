//! Order fulfillment and payment operations for the Admin API.

use inflyshop_bridge_core::Gid;
use tracing::instrument;

use super::{
    AdminClient, Metered, ShopifyError, TrackingInfo, check_user_errors, required,
    queries::{FulfillmentCreateV2, GetFulfillmentOrders, OrderMarkAsPaid},
};

impl AdminClient {
    /// Get the id of an order's first fulfillment order.
    ///
    /// Returns `None` when the order does not exist or has no fulfillment
    /// orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn first_fulfillment_order(
        &self,
        order_id: &Gid,
    ) -> Result<Metered<Option<Gid>>, ShopifyError> {
        use super::queries::get_fulfillment_orders::Variables;

        let variables = Variables {
            id: order_id.to_string(),
        };

        let response = self.execute::<GetFulfillmentOrders>(variables).await?;

        Ok(response.map(|data| {
            data.order
                .and_then(|order| order.fulfillment_orders.into_nodes().next())
                .map(|fulfillment_order| Gid::from_upstream(fulfillment_order.id))
        }))
    }

    /// Fulfill a fulfillment order and notify the customer.
    ///
    /// Returns the id of the new fulfillment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, the mutation reports user
    /// errors, or no fulfillment comes back.
    #[instrument(skip(self, tracking), fields(fulfillment_order_id = %fulfillment_order_id))]
    pub async fn create_fulfillment(
        &self,
        fulfillment_order_id: &Gid,
        tracking: TrackingInfo,
    ) -> Result<Metered<Gid>, ShopifyError> {
        use super::queries::fulfillment_create_v2::{
            FulfillmentOrderLineItemsInput, FulfillmentTrackingInput, FulfillmentV2Input,
            Variables,
        };

        let variables = Variables {
            fulfillment: FulfillmentV2Input {
                notify_customer: true,
                tracking_info: FulfillmentTrackingInput {
                    company: tracking.company,
                    number: tracking.number,
                    url: tracking.url,
                },
                line_items_by_fulfillment_order: vec![FulfillmentOrderLineItemsInput {
                    fulfillment_order_id: fulfillment_order_id.to_string(),
                }],
            },
        };

        let response = self.execute::<FulfillmentCreateV2>(variables).await?;
        let quota = response.quota;

        let payload = required(
            response.value.fulfillment_create_v2,
            "fulfillmentCreateV2 payload",
            quota,
        )?;
        check_user_errors(&payload.user_errors, quota)?;
        let fulfillment = required(payload.fulfillment, "created fulfillment", quota)?;

        tracing::debug!(status = ?fulfillment.status, "fulfillment created");

        Ok(Metered {
            value: Gid::from_upstream(fulfillment.id),
            quota,
        })
    }

    /// Mark an order as paid.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, the mutation reports user
    /// errors (e.g. the order is already paid), or no payload comes back.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_order_paid(&self, order_id: &Gid) -> Result<Metered<()>, ShopifyError> {
        use super::queries::order_mark_as_paid::{OrderMarkAsPaidInput, Variables};

        let variables = Variables {
            input: OrderMarkAsPaidInput {
                id: order_id.to_string(),
            },
        };

        let response = self.execute::<OrderMarkAsPaid>(variables).await?;
        let quota = response.quota;

        let payload = required(
            response.value.order_mark_as_paid,
            "orderMarkAsPaid payload",
            quota,
        )?;
        check_user_errors(&payload.user_errors, quota)?;

        Ok(Metered { value: (), quota })
    }
}
