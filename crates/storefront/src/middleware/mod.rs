//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (reuse or generate `x-request-id`)
//! 4. Security headers
//! 5. Session layer (tower-sessions with in-memory store)
//!
//! The admin guard is an extractor ([`RequireAdmin`]) rather than a layer.

pub mod admin;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use admin::RequireAdmin;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
