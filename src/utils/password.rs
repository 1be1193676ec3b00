//! Argon2id hashing for password-protected links.
//!
//! The plaintext is hashed with a per-hash random salt before persistence
//! and is never stored or logged.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors from hashing or verifying link passwords.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hash error: {0}")]
    Hash(String),
    #[error("Password verify error: {0}")]
    Verify(String),
}

/// Hashes a plaintext password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verifies a plaintext password against a stored Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| PasswordError::Verify(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
