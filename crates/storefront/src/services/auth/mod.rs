//! Admin authentication.
//!
//! A single administrator account is configured through the environment:
//! a username and an argon2 PHC hash of the password.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;

use crate::config::AdminConfig;

/// Checks admin credentials against the configured account.
pub struct AuthService<'a> {
    admin: &'a AdminConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(admin: &'a AdminConfig) -> Self {
        Self { admin }
    }

    /// Verify a login attempt.
    ///
    /// The password is always checked, so a wrong username costs the same as
    /// a wrong password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if either part does not match.
    pub fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let password_ok =
            verify_password(password, self.admin.password_hash.expose_secret()).is_ok();

        if password_ok && username == self.admin.username {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Hash a password into an argon2 PHC string, as expected in
/// `ADMIN_PASSWORD_HASH`.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
