//! Business logic services for the bridge.
//!
//! # Services
//!
//! - `notifier` - REST callbacks to the order-management system
//! - `sync` - Batch items translated into Admin API calls

pub mod notifier;
pub mod sync;

pub use notifier::{Notification, Notifier, NotifyError};
pub use sync::{Batch, BatchItem, SyncError, SyncService, inventory_delta};
