//! Application state shared across handlers.

use std::sync::Arc;

use savron_core::Product;

use crate::catalog::CatalogService;
use crate::config::StorefrontConfig;
use crate::db::ProductStore;
use crate::media::MediaHost;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// product store, the media host, the catalog cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    products: Arc<dyn ProductStore>,
    media: Arc<dyn MediaHost>,
    catalog: CatalogService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `products` - Product store (`PostgreSQL` or in-memory)
    /// * `media` - Media host for uploads
    /// * `seed` - Bundled seed catalog
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        products: Arc<dyn ProductStore>,
        media: Arc<dyn MediaHost>,
        seed: Vec<Product>,
    ) -> Self {
        let catalog = CatalogService::new(Arc::clone(&products), seed, config.catalog_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                media,
                catalog,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product store.
    #[must_use]
    pub fn products(&self) -> &dyn ProductStore {
        self.inner.products.as_ref()
    }

    /// Get a reference to the media host.
    #[must_use]
    pub fn media(&self) -> &dyn MediaHost {
        self.inner.media.as_ref()
    }

    /// Get a reference to the merged catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}
