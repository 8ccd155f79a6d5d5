//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::config::BridgeConfig;
use crate::dispatch::BatchDispatcher;
use crate::services::{Notifier, NotifyError, SyncService};
use crate::shopify::{AdminClient, ShopifyError};

/// Error building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("Notifier: {0}")]
    Notifier(#[from] NotifyError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and immutable after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BridgeConfig,
    sync: SyncService,
}

impl AppState {
    /// Create a new application state with the default rate governor.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: BridgeConfig) -> Result<Self, StateError> {
        Self::with_dispatcher(config, BatchDispatcher::default())
    }

    /// Create a new application state with a custom dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn with_dispatcher(
        config: BridgeConfig,
        dispatcher: BatchDispatcher,
    ) -> Result<Self, StateError> {
        let admin = AdminClient::new(&config.shopify)?;
        let notifier = Notifier::new(&config.downstream, config.shopify.shop())?;
        let sync = SyncService::new(admin, notifier, dispatcher);

        Ok(Self {
            inner: Arc::new(AppStateInner { config, sync }),
        })
    }

    /// Get a reference to the bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Get a reference to the batch sync service.
    #[must_use]
    pub fn sync(&self) -> &SyncService {
        &self.inner.sync
    }

    /// Get a reference to the downstream notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        self.inner.sync.notifier()
    }
}
