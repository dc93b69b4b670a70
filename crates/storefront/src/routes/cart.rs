//! Cart endpoints.
//!
//! The cart lives in the visitor's session. Each request loads it, applies
//! exactly one [`CartAction`] and writes it back; the response is the
//! resulting state.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use savron_core::{CartAction, CartItemInput, CartState, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// Add-to-cart request. Quantity defaults to one; zero or negative adds
/// nothing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Option<i64>,
}

impl AddItemRequest {
    fn quantity(&self) -> u32 {
        self.quantity
            .map_or(1, |quantity| u32::try_from(quantity.max(0)).unwrap_or(u32::MAX))
    }
}

/// Set-quantity request. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

async fn apply(session: &Session, action: CartAction) -> Result<Json<CartState>> {
    let cart = load_cart(session).await?.apply(action);
    save_cart(session, &cart).await?;
    Ok(Json(cart))
}

/// Current cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartState>> {
    Ok(Json(load_cart(&session).await?))
}

/// Add a catalog product to the cart.
///
/// The line item is a snapshot of the product as the catalog shows it now.
#[instrument(skip(state, session, payload))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartState>> {
    let Json(request) = payload?;

    let product = state
        .catalog()
        .product(&request.product_id)
        .await
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    add_breadcrumb("cart", "Added to cart", &[("product_id", product.id.as_str())]);

    apply(
        &session,
        CartAction::Add {
            item: CartItemInput::from(&product),
            quantity: request.quantity(),
        },
    )
    .await
}

/// Set the quantity of a line.
#[instrument(skip(session, payload))]
pub async fn set_quantity(
    session: Session,
    Path(id): Path<ProductId>,
    payload: std::result::Result<Json<SetQuantityRequest>, JsonRejection>,
) -> Result<Json<CartState>> {
    let Json(request) = payload?;
    apply(
        &session,
        CartAction::SetQuantity {
            id,
            quantity: request.quantity,
        },
    )
    .await
}

/// Remove a line. Unknown ids leave the cart unchanged.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<ProductId>) -> Result<Json<CartState>> {
    apply(&session, CartAction::Remove(id)).await
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartState>> {
    apply(&session, CartAction::Clear).await
}
