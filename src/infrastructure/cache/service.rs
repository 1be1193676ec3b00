//! Cache service trait, projection type, and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::Link;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),
    #[error("Cache operation error: {0}")]
    Operation(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Denormalized, non-authoritative projection of a [`Link`].
///
/// Deliberately omits the password hash itself and carries only a
/// `has_password` flag, so password verification always re-consults the
/// store. Any cached entry may be discarded and reconstructed from the
/// store without data loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLink {
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub has_password: bool,
    pub id: i64,
}

impl From<&Link> for CachedLink {
    fn from(link: &Link) -> Self {
        Self {
            original_url: link.original_url.clone(),
            expires_at: link.expires_at,
            has_password: link.is_password_protected(),
            id: link.id,
        }
    }
}

impl CachedLink {
    /// Returns true if the projected link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }
}

/// Outcome of a rate-limit counter check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: i64,
}

impl RateDecision {
    /// The fail-open decision used whenever the backend cannot answer.
    pub fn allow_all(limit: i64) -> Self {
        Self {
            allowed: true,
            remaining: limit,
        }
    }
}

/// Trait for the key-value cache layer.
///
/// Implementations must be thread-safe and degrade silently: a failed
/// lookup is a miss, a failed write is a no-op, a failed rate check
/// allows the request. No resolution or rate-limit path may fail outright
/// because the cache is unavailable.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached projection for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(projection))` on cache hit
    /// - `Ok(None)` on cache miss or backend error (fail-open behavior)
    async fn get_link(&self, short_code: &str) -> CacheResult<Option<CachedLink>>;

    /// Stores a link projection with optional TTL.
    ///
    /// `ttl_seconds = None` applies the implementation default.
    /// Implementations log errors and return `Ok(())` so cache writes never
    /// disrupt the request flow.
    async fn put_link(
        &self,
        short_code: &str,
        projection: &CachedLink,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached projection.
    ///
    /// Called synchronously as part of link deletion; TTL alone is never
    /// relied on for the deletion case.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Increments the ephemeral click counter for a code (24h expiry).
    ///
    /// The counter is a display/analytics hint, never the authoritative
    /// count. Returns 0 when the backend is unavailable.
    async fn increment_click_counter(&self, short_code: &str) -> CacheResult<i64>;

    /// Reads the ephemeral click counter. Returns 0 on miss or error.
    async fn get_click_counter(&self, short_code: &str) -> CacheResult<i64>;

    /// Checks and advances a fixed-window rate counter for an identifier.
    ///
    /// The first request in a window creates an expiring counter;
    /// subsequent requests increment it. Fails open: an unreachable
    /// backend yields `allowed = true`.
    async fn check_rate(
        &self,
        identifier: &str,
        limit: i64,
        window_secs: i64,
    ) -> CacheResult<RateDecision>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
