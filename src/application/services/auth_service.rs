//! Authentication collaborator validating opaque bearer tokens.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::repositories::TokenRepository;
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Service resolving bearer tokens to caller identities.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before
/// lookup. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret.
pub struct AuthService<R: TokenRepository + ?Sized> {
    repository: Arc<R>,
    signing_secret: String,
}

impl<R: TokenRepository + ?Sized> AuthService<R> {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `repository` - token repository for lookups
    /// - `signing_secret` - HMAC key; must match the value used when tokens were issued
    pub fn new(repository: Arc<R>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Hashes a raw token with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    fn hash_token(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Resolves a raw bearer token to the owning user id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if no user holds this token.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn authenticate(&self, token: &str) -> Result<i64, AppError> {
        let token_hash = self.hash_token(token);

        match self.repository.find_user_by_token_hash(&token_hash).await? {
            Some(user_id) => Ok(user_id),
            None => Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Invalid or revoked token" }),
            )),
        }
    }
}
