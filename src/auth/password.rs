// Password hashing and validation service

use crate::auth::error::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;
use tracing::error;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Password service for hashing and verification
pub struct PasswordService;

/// Stand-in hash checked when no account matches the login email
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| PasswordService::hash_password("decoy-password-for-unknown-accounts").ok())
        .as_deref()
}

impl PasswordService {
    /// Hash a password using Argon2id with a fresh random salt
    ///
    /// Returns a PHC string carrying the salt and parameters.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Argon2 hashing failed: {}", e);
                AuthError::PasswordHashError
            })
    }

    /// Verify a password against a hash
    ///
    /// A wrong password is `Ok(false)`; an unparsable stored hash is an error.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!("Stored password hash is not a PHC string: {}", e);
            AuthError::PasswordHashError
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Validate password strength requirements
    pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
        let length = password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    /// Hash on the blocking pool so request workers are not stalled by Argon2
    pub async fn hash_blocking(password: String) -> Result<String, AuthError> {
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| {
                error!("Password hashing task failed: {}", e);
                AuthError::PasswordHashError
            })?
    }

    /// Run a verification against the decoy hash on the blocking pool
    ///
    /// Always `false`; only the time spent matters.
    pub async fn verify_decoy_blocking(password: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || match decoy_hash() {
            Some(hash) => Self::verify_password(&password, hash).map(|_| false),
            None => Err(AuthError::PasswordHashError),
        })
        .await
        .map_err(|e| {
            error!("Password verification task failed: {}", e);
            AuthError::PasswordHashError
        })?
    }

    /// Verify on the blocking pool
    pub async fn verify_blocking(password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .map_err(|e| {
                error!("Password verification task failed: {}", e);
                AuthError::PasswordHashError
            })?
    }
}
