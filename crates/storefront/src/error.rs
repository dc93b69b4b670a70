//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use savron_core::{CheckoutError, PaymentError};

use crate::db::StoreError;
use crate::media::{MediaError, UploadPolicyError};
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Product store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Upload rejected before reaching the media host.
    #[error("Upload rejected: {0}")]
    UploadPolicy(#[from] UploadPolicyError),

    /// Media host failed or could not be reached.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Checkout details rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment form rejected.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Admin authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or expired admin session, or bad credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Validation(_))
            | Self::UploadPolicy(_)
            | Self::Checkout(_)
            | Self::Payment(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Media(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) | Self::Auth(AuthError::InvalidCredentials) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Store(StoreError::Database(_))
            | Self::Auth(AuthError::PasswordHash)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Store(StoreError::NotFound(_)) => "Product not found".to_string(),
            Self::Store(StoreError::Validation(err)) => err.to_string(),
            Self::UploadPolicy(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Payment(err) => err.to_string(),
            Self::Media(_) => "Failed to upload file".to_string(),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Store(StoreError::Database(_))
            | Self::Auth(AuthError::PasswordHash)
            | Self::Session(_)
            | Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Database(_))
                | Self::Media(_)
                | Self::Auth(AuthError::PasswordHash)
                | Self::Session(_)
                | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper and admin actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Set the Sentry user context to the logged-in admin.
pub fn set_sentry_admin(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
