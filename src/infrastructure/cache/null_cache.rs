//! No-op cache implementation for testing or disabled caching.

use super::service::{CacheResult, CacheService, CachedLink, RateDecision};
use async_trait::async_trait;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Used when Redis is unavailable or caching is explicitly disabled.
/// Every lookup is a miss, every write succeeds immediately, and every
/// rate check allows the request (fail-open).
///
/// # Use Cases
///
/// - Development environments without Redis
/// - Testing scenarios where caching should be bypassed
/// - Fallback when the Redis connection fails at startup
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_link(&self, _short_code: &str) -> CacheResult<Option<CachedLink>> {
        Ok(None)
    }

    async fn put_link(
        &self,
        _short_code: &str,
        _projection: &CachedLink,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _short_code: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn increment_click_counter(&self, _short_code: &str) -> CacheResult<i64> {
        Ok(0)
    }

    async fn get_click_counter(&self, _short_code: &str) -> CacheResult<i64> {
        Ok(0)
    }

    async fn check_rate(
        &self,
        _identifier: &str,
        limit: i64,
        _window_secs: i64,
    ) -> CacheResult<RateDecision> {
        Ok(RateDecision::allow_all(limit))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
