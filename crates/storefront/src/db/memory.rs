//! In-process product store.
//!
//! Used when no database URL is configured and by the tests. Contents are
//! lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use savron_core::{Product, ProductFields, ProductId};

use super::{ProductStore, StoreError};

/// Product store held in memory, in insertion order.
#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        // Later inserts win timestamp ties.
        let mut products: Vec<Product> = self.products.read().await.iter().rev().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get(&self, id: &ProductId) -> Result<Product, StoreError> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    #[instrument(skip(self, input))]
    async fn create(&self, input: ProductFields) -> Result<ProductId, StoreError> {
        let new = input.into_new()?;
        let id = ProductId::new(Uuid::new_v4().to_string());
        let product = new.into_product(id.clone(), Utc::now());

        tracing::info!(product_id = %id, name = %product.name, "Product created");
        self.products.write().await.push(product);
        Ok(id)
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    async fn update(&self, id: &ProductId, patch: ProductFields) -> Result<Product, StoreError> {
        patch.validate_patch()?;

        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        product.apply_patch(patch, Utc::now());
        Ok(product.clone())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        self.products.write().await.retain(|p| &p.id != id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
