//! Admin guard extractor.
//!
//! Every protected endpoint takes [`RequireAdmin`] as an argument, so the
//! guard runs before the handler body.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tower_sessions::Session;

use savron_core::{AdminGuardError, AdminSession};

use crate::error::AppError;
use crate::models::session as stored;

/// Extractor that requires a live admin session.
///
/// Missing sessions are rejected with 401. Expired sessions are removed from
/// the session store and rejected with 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn delete_product(
///     RequireAdmin(admin): RequireAdmin,
///     Path(id): Path<ProductId>,
/// ) -> Result<Json<Value>> {
///     tracing::info!(admin = %admin.username, "Deleting product");
///     // ...
/// }
/// ```
pub struct RequireAdmin(pub AdminSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Session is set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let current = stored::admin_session(&session).await?;

        match AdminSession::guard(current, Utc::now()) {
            Ok(admin) => Ok(Self(admin)),
            Err(err @ AdminGuardError::Expired(_)) => {
                stored::clear_admin_session(&session).await?;
                tracing::info!(error = %err, "Rejected expired admin session");
                Err(AppError::Unauthorized("Admin session expired".to_string()))
            }
            Err(AdminGuardError::Missing) => {
                Err(AppError::Unauthorized("Admin login required".to_string()))
            }
        }
    }
}
