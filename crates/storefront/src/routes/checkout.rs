//! Checkout endpoints: live quotes and the details step.

use axum::{
    Json,
    extract::{Query, rejection::JsonRejection, rejection::QueryRejection},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use savron_core::checkout::CheckoutForm;
use savron_core::{CheckoutError, CheckoutQuote, ShippingMethod, compute_quote};

use crate::error::Result;
use crate::models::session::{load_cart, set_checkout_details};

/// Query for the live order summary.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub shipping_method: Option<String>,
    pub gift_wrap: Option<bool>,
}

/// Totals for the current cart with the given options.
#[instrument(skip(session))]
pub async fn quote(
    session: Session,
    query: std::result::Result<Query<QuoteQuery>, QueryRejection>,
) -> Result<Json<CheckoutQuote>> {
    let Query(query) = query?;
    let method = match query.shipping_method.as_deref() {
        None | Some("") => ShippingMethod::default(),
        Some(raw) => raw.parse::<ShippingMethod>()?,
    };

    let cart = load_cart(&session).await?;
    Ok(Json(compute_quote(
        &cart,
        method,
        query.gift_wrap.unwrap_or(false),
    )))
}

/// Validate and store checkout details, returning the quote to pay.
#[instrument(skip(session, payload))]
pub async fn submit(
    session: Session,
    payload: std::result::Result<Json<CheckoutForm>, JsonRejection>,
) -> Result<Json<CheckoutQuote>> {
    let Json(form) = payload?;

    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let details = form.validate()?;
    set_checkout_details(&session, &details).await?;

    tracing::info!(
        shipping_method = %details.shipping_method,
        items = cart.item_count(),
        "Checkout details accepted"
    );
    Ok(Json(details.quote(&cart)))
}
