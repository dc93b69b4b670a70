//! Admin session token.
//!
//! An [`AdminSession`] is stored in the visitor's server-side session after a
//! successful login. Protected endpoints call [`AdminSession::guard`] before
//! doing anything else.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an admin login stays valid.
pub const ADMIN_SESSION_TTL_HOURS: i64 = 24;

/// Reasons the admin guard rejects a request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminGuardError {
    #[error("admin login required")]
    Missing,

    #[error("admin session expired at {0}")]
    Expired(DateTime<Utc>),
}

/// A logged-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Issue a session for `username` starting at `now`.
    #[must_use]
    pub fn issue(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            issued_at: now,
            expires_at: now + Duration::hours(ADMIN_SESSION_TTL_HOURS),
        }
    }

    /// Whether the session has run out at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check an optional session at `now`.
    ///
    /// # Errors
    ///
    /// [`AdminGuardError::Missing`] when there is no session,
    /// [`AdminGuardError::Expired`] when it has run out.
    pub fn guard(session: Option<Self>, now: DateTime<Utc>) -> Result<Self, AdminGuardError> {
        let session = session.ok_or(AdminGuardError::Missing)?;
        if session.is_expired(now) {
            return Err(AdminGuardError::Expired(session.expires_at));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_passes() {
        let now = Utc::now();
        let session = AdminSession::issue("admin", now);
        assert_eq!(session.expires_at - session.issued_at, Duration::hours(24));
        assert_eq!(
            AdminSession::guard(Some(session.clone()), now + Duration::hours(23)),
            Ok(session)
        );
    }

    #[test]
    fn test_expired_session_rejected() {
        let now = Utc::now();
        let session = AdminSession::issue("admin", now);
        let result = AdminSession::guard(Some(session.clone()), now + Duration::hours(24));
        assert_eq!(result, Err(AdminGuardError::Expired(session.expires_at)));
    }

    #[test]
    fn test_missing_session_rejected() {
        assert_eq!(
            AdminSession::guard(None, Utc::now()),
            Err(AdminGuardError::Missing)
        );
    }
}
