//! Catalog service.
//!
//! Builds the shop listing from the product store and the bundled seed
//! catalog using [`savron_core::catalog::merge_catalog`]. The store listing is
//! cached with `moka` for a short TTL and dropped on every product write.
//! A fetch that overlaps a write is served but not cached.
//!
//! When the store cannot be reached the service falls back to the last
//! listing it fetched successfully, or to the seed catalog alone, and flags
//! the result as degraded.

pub mod seed;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use savron_core::catalog::{CatalogQuery, CatalogView, find_product, merge_catalog};
use savron_core::{Product, ProductId};

use crate::db::ProductStore;

pub use seed::{SeedError, seed_products};

const STORE_LISTING_KEY: &str = "store";

/// A merged listing and whether it was built without a live store response.
#[derive(Debug, Clone)]
pub struct Listing {
    pub products: Vec<Product>,
    pub degraded: bool,
}

/// Merged product catalog with store caching and degraded fallback.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    store: Arc<dyn ProductStore>,
    seed: Vec<Product>,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
    last_good: RwLock<Option<Arc<Vec<Product>>>>,
    /// Bumped by every invalidation.
    generation: AtomicU64,
}

impl CatalogService {
    /// Create a service over `store` with the given seed catalog.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, seed: Vec<Product>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                store,
                seed,
                cache,
                last_good: RwLock::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The full merged listing.
    #[instrument(skip(self))]
    pub async fn listing(&self) -> Listing {
        if let Some(products) = self.inner.cache.get(STORE_LISTING_KEY).await {
            debug!("Cache hit for store listing");
            return self.merged(&products, false);
        }

        let generation = self.inner.generation.load(Ordering::Acquire);
        match self.inner.store.list().await {
            Ok(products) => {
                let products = Arc::new(products);
                let mut last_good = self.inner.last_good.write().await;
                if self.inner.generation.load(Ordering::Acquire) == generation {
                    self.inner
                        .cache
                        .insert(STORE_LISTING_KEY, Arc::clone(&products))
                        .await;
                    *last_good = Some(Arc::clone(&products));
                } else {
                    debug!("Product written during fetch, not caching listing");
                }
                drop(last_good);
                self.merged(&products, false)
            }
            Err(e) => {
                warn!(error = %e, "Product store unavailable, serving degraded catalog");
                let fallback = self.inner.last_good.read().await.clone();
                fallback.map_or_else(
                    || Listing {
                        products: self.inner.seed.clone(),
                        degraded: true,
                    },
                    |products| self.merged(&products, true),
                )
            }
        }
    }

    /// Filtered listing with category facets.
    pub async fn view(&self, query: &CatalogQuery) -> CatalogView {
        let listing = self.listing().await;
        CatalogView::build(&listing.products, query, listing.degraded)
    }

    /// Look up one product in the merged listing.
    pub async fn product(&self, id: &ProductId) -> Option<Product> {
        let listing = self.listing().await;
        find_product(&listing.products, id).cloned()
    }

    /// Drop the cached store listing after a product write.
    ///
    /// Fetches already in flight will not cache what they read.
    pub async fn invalidate(&self) {
        let _last_good = self.inner.last_good.write().await;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    fn merged(&self, store: &[Product], degraded: bool) -> Listing {
        Listing {
            products: merge_catalog(store.to_vec(), &self.inner.seed),
            degraded,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use savron_core::{Money, ProductFields};

    use super::*;
    use crate::db::{MemoryProductStore, StoreError};

    /// Wraps a memory store and fails every call while `down` is set.
    struct FlakyStore {
        inner: MemoryProductStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.down.load(Ordering::SeqCst) {
                Err(StoreError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ProductStore for FlakyStore {
        async fn list(&self) -> Result<Vec<Product>, StoreError> {
            self.check()?;
            self.inner.list().await
        }

        async fn get(&self, id: &ProductId) -> Result<Product, StoreError> {
            self.check()?;
            self.inner.get(id).await
        }

        async fn create(&self, fields: ProductFields) -> Result<ProductId, StoreError> {
            self.check()?;
            self.inner.create(fields).await
        }

        async fn update(&self, id: &ProductId, patch: ProductFields) -> Result<Product, StoreError> {
            self.check()?;
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete(id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.check()
        }
    }

    /// Memory store whose next `list` takes its snapshot, then parks until
    /// released.
    struct GatedStore {
        inner: MemoryProductStore,
        hold: AtomicBool,
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ProductStore for GatedStore {
        async fn list(&self) -> Result<Vec<Product>, StoreError> {
            let products = self.inner.list().await?;
            if self.hold.swap(false, Ordering::SeqCst) {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(products)
        }

        async fn get(&self, id: &ProductId) -> Result<Product, StoreError> {
            self.inner.get(id).await
        }

        async fn create(&self, fields: ProductFields) -> Result<ProductId, StoreError> {
            self.inner.create(fields).await
        }

        async fn update(&self, id: &ProductId, patch: ProductFields) -> Result<Product, StoreError> {
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn fields(name: &str) -> ProductFields {
        ProductFields {
            name: Some(name.to_string()),
            description: Some("Stone-ground cocoa".to_string()),
            price: Some(Money::from_cents(999)),
            category: Some("Chocolate Bars".to_string()),
            ..ProductFields::default()
        }
    }

    fn service(store: Arc<FlakyStore>) -> CatalogService {
        CatalogService::new(store, seed_products().unwrap(), Duration::from_secs(60))
    }

    fn flaky() -> Arc<FlakyStore> {
        Arc::new(FlakyStore {
            inner: MemoryProductStore::new(),
            down: AtomicBool::new(false),
        })
    }

    #[tokio::test]
    async fn test_store_products_precede_seed() {
        let store = flaky();
        store.create(fields("Old Bar")).await.unwrap();
        store.create(fields("New Bar")).await.unwrap();

        let listing = service(store).listing().await;
        let names: Vec<&str> = listing.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(&names[..2], &["New Bar", "Old Bar"]);
        assert_eq!(listing.products[2].id.as_str(), "default-1");
        assert_eq!(listing.products.len(), 6);
        assert!(!listing.degraded);
    }

    #[tokio::test]
    async fn test_unreachable_store_without_history_serves_seed_only() {
        let store = flaky();
        store.create(fields("Hidden Bar")).await.unwrap();
        store.down.store(true, Ordering::SeqCst);

        let listing = service(store).listing().await;
        assert!(listing.degraded);
        assert_eq!(listing.products.len(), 4);
        assert!(listing.products.iter().all(|p| p.id.is_seed()));
    }

    #[tokio::test]
    async fn test_unreachable_store_serves_last_good_listing() {
        let store = flaky();
        store.create(fields("Cached Bar")).await.unwrap();
        let catalog = service(Arc::clone(&store));

        assert!(!catalog.listing().await.degraded);

        catalog.invalidate().await;
        store.down.store(true, Ordering::SeqCst);

        let listing = catalog.listing().await;
        assert!(listing.degraded);
        assert_eq!(listing.products[0].name, "Cached Bar");
        assert_eq!(listing.products.len(), 5);
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_writes() {
        let store = flaky();
        let catalog = service(Arc::clone(&store));
        assert_eq!(catalog.listing().await.products.len(), 4);

        let id = store.create(fields("Fresh Bar")).await.unwrap();
        assert_eq!(catalog.listing().await.products.len(), 4);

        catalog.invalidate().await;
        assert_eq!(catalog.product(&id).await.unwrap().name, "Fresh Bar");
    }

    #[tokio::test]
    async fn test_fetch_overlapping_write_is_not_cached() {
        let store = Arc::new(GatedStore {
            inner: MemoryProductStore::new(),
            hold: AtomicBool::new(true),
            started: Notify::new(),
            release: Notify::new(),
        });
        let catalog = CatalogService::new(
            Arc::clone(&store) as Arc<dyn ProductStore>,
            seed_products().unwrap(),
            Duration::from_secs(60),
        );

        let in_flight = tokio::spawn({
            let catalog = catalog.clone();
            async move { catalog.listing().await }
        });
        store.started.notified().await;

        store.create(fields("Late Bar")).await.unwrap();
        catalog.invalidate().await;
        store.release.notify_one();

        let stale = in_flight.await.unwrap();
        assert_eq!(stale.products.len(), 4);

        let fresh = catalog.listing().await;
        assert_eq!(fresh.products.len(), 5);
        assert_eq!(fresh.products[0].name, "Late Bar");
    }

    #[tokio::test]
    async fn test_view_filters_and_counts() {
        let catalog = service(flaky());
        let view = catalog
            .view(&CatalogQuery {
                premium: Some(true),
                ..CatalogQuery::default()
            })
            .await;

        assert_eq!(view.products.len(), 2);
        assert_eq!(view.categories.len(), 4);
        assert!(!view.degraded);
    }
}
