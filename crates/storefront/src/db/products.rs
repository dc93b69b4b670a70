//! `PostgreSQL` product store.
//!
//! Queries are runtime-checked so the crate builds without a live database.
//! Array fields are stored as JSONB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::{Decimal, Json};
use tracing::instrument;
use uuid::Uuid;

use savron_core::{Money, Product, ProductFields, ProductId};

use super::{ProductStore, StoreError};

const SELECT_COLUMNS: &str = r"
    SELECT id, name, description, price, category, in_stock, images,
           ingredients, allergens, features, weight, origin, premium,
           created_at, updated_at
    FROM storefront.product
";

/// Product store backed by the `storefront.product` table.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write(&self, product: &Product, insert: bool) -> Result<u64, StoreError> {
        let sql = if insert {
            r"
            INSERT INTO storefront.product
                (id, name, description, price, category, in_stock, images,
                 ingredients, allergens, features, weight, origin, premium,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "
        } else {
            r"
            UPDATE storefront.product
            SET name = $2, description = $3, price = $4, category = $5,
                in_stock = $6, images = $7, ingredients = $8, allergens = $9,
                features = $10, weight = $11, origin = $12, premium = $13,
                created_at = $14, updated_at = $15
            WHERE id = $1
            "
        };

        let now = Utc::now();
        let result = sqlx::query(sql)
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price.amount())
            .bind(&product.category)
            .bind(product.in_stock)
            .bind(Json(&product.images))
            .bind(Json(&product.ingredients))
            .bind(Json(&product.allergens))
            .bind(product.features.as_ref().map(Json))
            .bind(&product.weight)
            .bind(&product.origin)
            .bind(product.premium)
            .bind(product.created_at.unwrap_or(now))
            .bind(product.updated_at.unwrap_or(now))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get(&self, id: &ProductId) -> Result<Product, StoreError> {
        sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Product::from)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    #[instrument(skip(self, input))]
    async fn create(&self, input: ProductFields) -> Result<ProductId, StoreError> {
        let new = input.into_new()?;
        let id = ProductId::new(Uuid::new_v4().to_string());
        let product = new.into_product(id.clone(), Utc::now());

        self.write(&product, true).await?;

        tracing::info!(product_id = %id, name = %product.name, "Product created");
        Ok(id)
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    async fn update(&self, id: &ProductId, patch: ProductFields) -> Result<Product, StoreError> {
        patch.validate_patch()?;

        let mut product = self.get(id).await?;
        product.apply_patch(patch, Utc::now());

        if self.write(&product, false).await? == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }

        tracing::info!("Product updated");
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        tracing::info!(deleted = result.rows_affected(), "Product delete");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

/// Internal row type for product queries.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    in_stock: bool,
    images: Json<Vec<String>>,
    ingredients: Json<Vec<String>>,
    allergens: Json<Vec<String>>,
    features: Option<Json<Vec<String>>>,
    weight: String,
    origin: String,
    premium: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: Money::new(row.price),
            category: row.category,
            in_stock: row.in_stock,
            images: row.images.0,
            ingredients: row.ingredients.0,
            allergens: row.allergens.0,
            features: row.features.map(|f| f.0),
            weight: row.weight,
            origin: row.origin,
            premium: row.premium,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}
