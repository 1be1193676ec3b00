//! Short code generation and custom alias validation.
//!
//! Provides cryptographically secure random code generation and validation
//! for caller-supplied aliases. Generation does not guarantee uniqueness;
//! the store's unique constraint does, and callers retry on conflict.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Length of random bytes before base64 encoding.
///
/// 6 bytes encode to exactly 8 URL-safe characters without padding.
const CODE_LENGTH_BYTES: usize = 6;

/// Codes that cannot be used as aliases to prevent routing conflicts.
const RESERVED_ALIASES: &[&str] = &["api", "health", "shorten", "urls", "analytics"];

/// Generates a cryptographically secure random short code.
///
/// Uses `getrandom` for entropy and encodes the result as URL-safe base64
/// without padding, producing an 8-character code drawn from a uniform
/// 64-symbol alphabet.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn generate_code() -> String {
    let mut buffer = [0u8; CODE_LENGTH_BYTES];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
}

/// Validates a caller-supplied custom alias.
///
/// # Rules
///
/// - Length: 3-50 characters
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
/// - Cannot be a reserved route word
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_alias(alias: &str) -> Result<(), AppError> {
    if alias.len() < 3 || alias.len() > 50 {
        return Err(AppError::bad_request(
            "Custom alias must be 3-50 characters",
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::bad_request(
            "Custom alias can only contain letters, digits, hyphens, and underscores",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_ALIASES.contains(&alias) {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}
