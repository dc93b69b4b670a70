//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness
//! GET    /health/ready               - Readiness (product store ping)
//!
//! # Products (writes require admin)
//! GET    /api/products               - Store products, newest first
//! POST   /api/products               - Create product
//! PUT    /api/products/{id}          - Partial update
//! DELETE /api/products/{id}          - Delete (idempotent)
//! POST   /api/upload                 - Multipart media upload (admin)
//!
//! # Catalog
//! GET    /api/catalog                - Merged listing (?category=&q=&premium=)
//! GET    /api/catalog/{id}           - Product detail
//!
//! # Cart (session)
//! GET    /api/cart                   - Current cart
//! POST   /api/cart/items             - Add product
//! PUT    /api/cart/items/{id}        - Set quantity
//! DELETE /api/cart/items/{id}        - Remove line
//! DELETE /api/cart                   - Clear
//!
//! # Checkout
//! GET    /api/checkout/quote         - Live totals (?shippingMethod=&giftWrap=)
//! POST   /api/checkout               - Submit details
//! POST   /api/payment                - Simulated payment
//! GET    /api/orders/latest          - Last confirmation
//!
//! # Admin
//! POST   /api/admin/login            - Start admin session
//! POST   /api/admin/logout           - End admin session
//! GET    /api/admin/session          - Current admin session
//! ```

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the product administration routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", put(products::update).delete(products::delete))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/{id}", get(catalog::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", put(cart::set_quantity).delete(cart::remove))
}

/// Create the admin session routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/session", get(admin::status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/products", product_routes())
        .route(
            "/api/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload::UPLOAD_BODY_LIMIT)),
        )
        .nest("/api/catalog", catalog_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout/quote", get(checkout::quote))
        .route("/api/checkout", post(checkout::submit))
        .route("/api/payment", post(orders::pay))
        .route("/api/orders/latest", get(orders::latest))
        .nest("/api/admin", admin_routes())
}
