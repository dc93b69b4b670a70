//! Simulated payment and order confirmations.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use rand::Rng;
use tower_sessions::Session;
use tracing::instrument;

use savron_core::payment::order_number;
use savron_core::{CheckoutError, OrderConfirmation, PaymentForm};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session::{
    checkout_details, clear_checkout_details, latest_order, load_cart, reload, save_cart,
    set_latest_order,
};
use crate::state::AppState;

/// Validate the payment form, simulate processing and place the order.
///
/// No card data is stored or sent anywhere; only the last four digits end up
/// in the confirmation. Only the lines that were paid for leave the cart.
#[instrument(skip(state, session, payload))]
pub async fn pay(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<PaymentForm>, JsonRejection>,
) -> Result<Json<OrderConfirmation>> {
    let Json(form) = payload?;

    let details = checkout_details(&session)
        .await?
        .ok_or_else(|| AppError::BadRequest("Checkout details are missing".to_string()))?;

    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let card = form.validate(Utc::now().date_naive())?;

    tokio::time::sleep(state.config().payment_delay).await;

    let placed_at = Utc::now();
    let serial = rand::rng().random_range(0..1_000_000);
    let confirmation = OrderConfirmation::build(
        order_number(placed_at, serial),
        placed_at,
        &cart,
        &details,
        &card,
    );

    // The cart may have changed while the payment was processing.
    reload(&session).await?;
    let remaining = load_cart(&session).await?.settle(cart.items());

    set_latest_order(&session, &confirmation).await?;
    save_cart(&session, &remaining).await?;
    clear_checkout_details(&session).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_number", confirmation.order_number.as_str())],
    );
    tracing::info!(
        order_number = %confirmation.order_number,
        total = %confirmation.totals.total,
        "Order placed"
    );

    Ok(Json(confirmation))
}

/// The last order placed in this session.
#[instrument(skip(session))]
pub async fn latest(session: Session) -> Result<Json<OrderConfirmation>> {
    latest_order(&session)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No order found".to_string()))
}
