//! Admin login, logout and session status.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use savron_core::AdminSession;

use crate::error::{Result, clear_sentry_user, set_sentry_admin};
use crate::middleware::RequireAdmin;
use crate::models::session::{clear_admin_session, set_admin_session};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login request.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Who is logged in and until when.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&AdminSession> for SessionInfo {
    fn from(admin: &AdminSession) -> Self {
        Self {
            username: admin.username.clone(),
            expires_at: admin.expires_at,
        }
    }
}

/// Check the credentials and start an admin session.
#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionInfo>> {
    let Json(request) = payload?;

    if let Err(e) = AuthService::new(&state.config().admin).login(&request.username, &request.password)
    {
        tracing::warn!(username = %request.username, "Admin login failed");
        return Err(e.into());
    }

    // New id on privilege change
    session.cycle_id().await?;

    let admin = AdminSession::issue(request.username, Utc::now());
    set_admin_session(&session, &admin).await?;
    set_sentry_admin(&admin.username);

    tracing::info!(username = %admin.username, expires_at = %admin.expires_at, "Admin logged in");
    Ok(Json(SessionInfo::from(&admin)))
}

/// End the admin session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_admin_session(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Report the current admin session.
#[instrument(skip(admin))]
pub async fn status(RequireAdmin(admin): RequireAdmin) -> Json<SessionInfo> {
    Json(SessionInfo::from(&admin))
}
