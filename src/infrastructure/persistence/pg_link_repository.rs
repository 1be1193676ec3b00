//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// PostgreSQL repository for the authoritative link store.
///
/// Uniqueness of `short_code` and `custom_alias` is enforced by table
/// constraints; violations map to the distinct duplicate error kinds in
/// [`AppError`]. The click counter is advanced with a single atomic
/// UPDATE so concurrent redirects never lose increments.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let link = sqlx::query_as::<_, Link>(
            r#"
            INSERT INTO urls (
                short_code, custom_alias, original_url, expires_at,
                password_hash, platform_reference, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, short_code, custom_alias, original_url, expires_at,
                      password_hash, click_count, platform_reference, owner_id, created_at
            "#,
        )
        .bind(&new_link.short_code)
        .bind(&new_link.custom_alias)
        .bind(&new_link.original_url)
        .bind(new_link.expires_at)
        .bind(&new_link.password_hash)
        .bind(&new_link.platform_reference)
        .bind(new_link.owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let link = sqlx::query_as::<_, Link>(
            r#"
            SELECT id, short_code, custom_alias, original_url, expires_at,
                   password_hash, click_count, platform_reference, owner_id, created_at
            FROM urls
            WHERE short_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn find_by_owner(
        &self,
        owner_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        let links = sqlx::query_as::<_, Link>(
            r#"
            SELECT id, short_code, custom_alias, original_url, expires_at,
                   password_hash, click_count, platform_reference, owner_id, created_at
            FROM urls
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn increment_clicks(&self, id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE urls
            SET click_count = click_count + 1
            WHERE id = $1
            RETURNING click_count
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        count.ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM urls WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
