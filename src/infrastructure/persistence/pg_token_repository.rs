//! PostgreSQL implementation of the token repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::TokenRepository;
use crate::error::AppError;

/// PostgreSQL repository for identity token lookups.
///
/// Stores only HMAC-SHA256 digests; a reader of the `users` table cannot
/// recover or forge bearer tokens without the server-side signing secret.
pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        let user_id =
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE token_hash = $1")
                .bind(token_hash)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(user_id)
    }
}
