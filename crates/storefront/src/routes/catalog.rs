//! Public catalog endpoints.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use tracing::instrument;

use savron_core::catalog::{CatalogQuery, CatalogView};
use savron_core::{Product, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Merged listing filtered by category, search text and premium flag.
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    query: std::result::Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<CatalogView>> {
    let Query(query) = query?;
    Ok(Json(state.catalog().view(&query).await))
}

/// One product from the merged listing.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .product(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}
