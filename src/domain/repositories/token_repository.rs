//! Repository trait for identity token lookups.

use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface backing the authentication collaborator.
///
/// Tokens are stored hashed; lookups are by HMAC-SHA256 digest, never by
/// the raw bearer value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Resolves a token hash to the owning user id.
    ///
    /// Returns `Ok(None)` when no user holds this token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<i64>, AppError>;
}
