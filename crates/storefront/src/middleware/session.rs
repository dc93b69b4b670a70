//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. Carts, checkout details
//! and admin logins are lost when the process restarts.

use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "savron_session";

/// Session expiry after inactivity, in hours.
const SESSION_EXPIRY_HOURS: i64 = 24;

/// Create the session layer over an in-memory store.
///
/// Cookies are marked `Secure` when the base URL is https.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_EXPIRY_HOURS)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
