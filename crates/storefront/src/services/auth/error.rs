//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Hashing a password failed.
    #[error("password hashing failed")]
    PasswordHash,
}
