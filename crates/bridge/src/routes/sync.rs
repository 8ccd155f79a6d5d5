//! Batch routes called by the order-management system.
//!
//! Each handler checks the shared secret, parses the whole body and hands
//! the items to the sync service. The response is sent before any upstream
//! call is made.

use axum::{body::Bytes, extract::State};
use inflyshop_bridge_core::{
    CreateProductsRequest, FulfillmentRequest, InventoryRecord, PaymentMarkRequest, PriceRecord,
};
use tracing::instrument;

use super::parse_body;
use crate::error::AppError;
use crate::middleware::{AUTH_COMPLETED, RequireSharedSecret};
use crate::services::{Batch, BatchItem};
use crate::state::AppState;

fn accept(state: &AppState, batch: Batch, items: Vec<BatchItem>) -> &'static str {
    tracing::info!(batch = batch.label(), items = items.len(), "batch accepted");
    state.sync().spawn_batch(batch, items);
    AUTH_COMPLETED
}

/// `POST /createProducts`
#[instrument(skip_all)]
pub async fn create_products(
    _auth: RequireSharedSecret,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let request: CreateProductsRequest = parse_body(&body)?;
    let items = BatchItem::from_products(request.products);
    Ok(accept(&state, Batch::CreateProducts, items))
}

/// `POST /syncInventory`
#[instrument(skip_all)]
pub async fn sync_inventory(
    _auth: RequireSharedSecret,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let records: Vec<InventoryRecord> = parse_body(&body)?;
    let items = records.into_iter().map(BatchItem::SyncInventory).collect();
    Ok(accept(&state, Batch::SyncInventory, items))
}

/// `POST /syncPrice`
#[instrument(skip_all)]
pub async fn sync_price(
    _auth: RequireSharedSecret,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let records: Vec<PriceRecord> = parse_body(&body)?;
    let items = records.into_iter().map(BatchItem::SyncPrice).collect();
    Ok(accept(&state, Batch::SyncPrice, items))
}

/// `POST /setFulfillment`
#[instrument(skip_all)]
pub async fn set_fulfillment(
    _auth: RequireSharedSecret,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let requests: Vec<FulfillmentRequest> = parse_body(&body)?;
    let items = requests.into_iter().map(BatchItem::Fulfill).collect();
    Ok(accept(&state, Batch::SetFulfillment, items))
}

/// `POST /setPaid`
#[instrument(skip_all)]
pub async fn set_paid(
    _auth: RequireSharedSecret,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let requests: Vec<PaymentMarkRequest> = parse_body(&body)?;
    let items = requests.into_iter().map(BatchItem::MarkPaid).collect();
    Ok(accept(&state, Batch::SetPaid, items))
}
