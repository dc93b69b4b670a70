//! Product store access.
//!
//! Products live either in `PostgreSQL` (table `storefront.product`) or, when
//! no database URL is configured, in process memory. Both implement
//! [`ProductStore`]; handlers and the catalog only see the trait.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/`, embedded in the
//! binary and applied at startup by [`run_migrations`].

pub mod memory;
pub mod products;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use savron_core::{Product, ProductFields, ProductId, ProductValidationError};

pub use memory::MemoryProductStore;
pub use products::PgProductStore;

/// Errors raised by a [`ProductStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No product with this id.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The submitted fields were rejected; nothing was written.
    #[error(transparent)]
    Validation(#[from] ProductValidationError),

    /// The backing database failed or could not be reached.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Access to the product document store.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, newest `createdAt` first.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// One product by id.
    async fn get(&self, id: &ProductId) -> Result<Product, StoreError>;

    /// Validate and insert a product, returning its new id.
    ///
    /// Sets `createdAt` and `updatedAt`. Nothing is written when validation
    /// fails.
    async fn create(&self, fields: ProductFields) -> Result<ProductId, StoreError>;

    /// Apply a partial update; absent fields are left unchanged.
    async fn update(&self, id: &ProductId, patch: ProductFields) -> Result<Product, StoreError>;

    /// Remove a product. Deleting an unknown id succeeds.
    async fn delete(&self, id: &ProductId) -> Result<(), StoreError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply the embedded storefront migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
