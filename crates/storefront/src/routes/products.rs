//! Product administration API.
//!
//! Reads are public; writes require an admin session and drop the cached
//! catalog listing.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use savron_core::{Product, ProductFields, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// List store products, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().list().await?))
}

/// Create a product.
#[instrument(skip(state, admin, payload), fields(admin = %admin.username))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: std::result::Result<Json<ProductFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(fields) = payload?;
    let id = state.products().create(fields).await?;
    state.catalog().invalidate().await;

    add_breadcrumb("admin", "Created product", &[("product_id", id.as_str())]);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "productId": id,
        })),
    ))
}

/// Apply a partial update to a product.
#[instrument(skip(state, admin, payload), fields(admin = %admin.username))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    payload: std::result::Result<Json<ProductFields>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(patch) = payload?;
    let product = state.products().update(&id, patch).await?;
    state.catalog().invalidate().await;

    add_breadcrumb("admin", "Updated product", &[("product_id", id.as_str())]);

    Ok(Json(json!({
        "message": "Product updated successfully",
        "product": product,
    })))
}

/// Delete a product. Unknown ids succeed.
#[instrument(skip(state, admin), fields(admin = %admin.username))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    state.products().delete(&id).await?;
    state.catalog().invalidate().await;

    add_breadcrumb("admin", "Deleted product", &[("product_id", id.as_str())]);

    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
