//! Session-held models for the storefront.
//!
//! Carts, checkout details, the latest order confirmation and the admin
//! session all live in the visitor's server-side session.

pub mod session;

pub use session::keys as session_keys;
