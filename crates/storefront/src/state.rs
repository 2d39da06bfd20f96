//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::saved::SavedProducts;
use crate::services::{Geocoder, Payments};
use crate::wizard::PreviewStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every service is built once
/// here at startup; handlers reach them through the accessors.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    catalog: Catalog,
    saved: SavedProducts<BackendClient>,
    previews: PreviewStore,
    payments: Payments,
    geocoder: Geocoder,
}

impl AppState {
    /// Build all services from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = BackendClient::new(&config.backend);
        let catalog = Catalog::new(backend.clone());
        let saved = SavedProducts::new(backend.clone());
        let payments = Payments::new(&config.payments);
        let geocoder = Geocoder::new(&config.geocoding);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                catalog,
                saved,
                previews: PreviewStore::default(),
                payments,
                geocoder,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the hosted backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Per-user saved products.
    #[must_use]
    pub fn saved(&self) -> &SavedProducts<BackendClient> {
        &self.inner.saved
    }

    /// Listing photo previews.
    #[must_use]
    pub fn previews(&self) -> &PreviewStore {
        &self.inner.previews
    }

    #[must_use]
    pub fn payments(&self) -> &Payments {
        &self.inner.payments
    }

    #[must_use]
    pub fn geocoder(&self) -> &Geocoder {
        &self.inner.geocoder
    }
}
