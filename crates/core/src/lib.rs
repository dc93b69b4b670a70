//! Savron Core - storefront domain logic.
//!
//! Everything in this crate is pure: no I/O, no database access, no HTTP
//! clients. The `savron-storefront` server wires these pieces to sessions,
//! the product store and the media host.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, emails and product records
//! - [`cart`] - The cart state machine
//! - [`checkout`] - Checkout form validation and order totals
//! - [`catalog`] - Merging and filtering the product catalog
//! - [`payment`] - Payment form validation and order confirmations
//! - [`session`] - Admin session token and guard

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod session;
pub mod types;

pub use cart::{CartAction, CartItemInput, CartLineItem, CartState};
pub use checkout::{CheckoutDetails, CheckoutError, CheckoutQuote, ShippingMethod, compute_quote};
pub use payment::{OrderConfirmation, PaymentError, PaymentForm};
pub use session::{AdminGuardError, AdminSession};
pub use types::*;
