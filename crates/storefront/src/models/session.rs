//! Session-related types and accessors.
//!
//! Typed helpers over `tower_sessions::Session` so handlers never spell out
//! keys or value types themselves.

use tower_sessions::Session;
use tower_sessions::session::Error;

use savron_core::{AdminSession, CartState, CheckoutDetails, OrderConfirmation};

/// Session keys.
pub mod keys {
    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// Validated checkout details awaiting payment.
    pub const CHECKOUT_DETAILS: &str = "checkout_details";

    /// Confirmation of the last order placed in this session.
    pub const LATEST_ORDER: &str = "latest_order";

    /// The logged-in administrator.
    pub const ADMIN_SESSION: &str = "admin_session";
}

/// Load the cart, or an empty one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<CartState, Error> {
    Ok(session
        .get::<CartState>(keys::CART)
        .await?
        .unwrap_or_default())
}

/// Re-read the session record, picking up writes other requests made since
/// this one started.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn reload(session: &Session) -> Result<(), Error> {
    session.load().await
}

/// Write the cart back.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &CartState) -> Result<(), Error> {
    session.insert(keys::CART, cart).await
}

/// Checkout details stored by the checkout step, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn checkout_details(session: &Session) -> Result<Option<CheckoutDetails>, Error> {
    session.get(keys::CHECKOUT_DETAILS).await
}

/// Store validated checkout details.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_checkout_details(
    session: &Session,
    details: &CheckoutDetails,
) -> Result<(), Error> {
    session.insert(keys::CHECKOUT_DETAILS, details).await
}

/// Drop the checkout details after payment.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_checkout_details(session: &Session) -> Result<(), Error> {
    session
        .remove::<CheckoutDetails>(keys::CHECKOUT_DETAILS)
        .await?;
    Ok(())
}

/// The last confirmation placed in this session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn latest_order(session: &Session) -> Result<Option<OrderConfirmation>, Error> {
    session.get(keys::LATEST_ORDER).await
}

/// Remember an order confirmation.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_latest_order(session: &Session, order: &OrderConfirmation) -> Result<(), Error> {
    session.insert(keys::LATEST_ORDER, order).await
}

/// The stored admin session, expired or not.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn admin_session(session: &Session) -> Result<Option<AdminSession>, Error> {
    session.get(keys::ADMIN_SESSION).await
}

/// Store an admin session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_admin_session(session: &Session, admin: &AdminSession) -> Result<(), Error> {
    session.insert(keys::ADMIN_SESSION, admin).await
}

/// Remove the admin session (logout or expiry).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_admin_session(session: &Session) -> Result<(), Error> {
    session.remove::<AdminSession>(keys::ADMIN_SESSION).await?;
    Ok(())
}
