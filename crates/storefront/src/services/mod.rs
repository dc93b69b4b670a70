//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Admin credential check (argon2)

pub mod auth;
