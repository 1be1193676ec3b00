//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, CachedLink, RateDecision};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// TTL for ephemeral click counters (24 hours).
const CLICK_COUNTER_TTL_SECS: i64 = 86_400;

/// Redis cache for link projections, click counter hints, and rate counters.
///
/// Uses a shared `ConnectionManager` that reconnects transparently on
/// failure. Every operation carries a short timeout and is fail-open:
/// errors are logged at this boundary and never propagate as request
/// failures.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and
    /// configures the default TTL and per-operation timeout.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied when [`CacheService::put_link`]
    ///   is called with `ttl_seconds = None`; controlled via `CACHE_TTL_SECONDS`
    /// - `op_timeout_ms` - per-call budget; a slow cache degrades to a
    ///   store-only path instead of stalling the request
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(
        redis_url: &str,
        default_ttl_seconds: u64,
        op_timeout_ms: u64,
    ) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            op_timeout: Duration::from_millis(op_timeout_ms),
        })
    }

    fn url_key(short_code: &str) -> String {
        format!("url:{}", short_code)
    }

    fn clicks_key(short_code: &str) -> String {
        format!("clicks:{}", short_code)
    }

    fn rate_key(identifier: &str) -> String {
        format!("rate:{}", identifier)
    }

    /// Runs a cache operation under the per-call timeout.
    ///
    /// Returns `None` on timeout or backend error, after logging.
    async fn run<T, F>(&self, op: &str, key: &str, fut: F) -> Option<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("Redis {} error for {}: {}", op, key, e);
                None
            }
            Err(_) => {
                warn!("Redis {} timed out for {}", op, key);
                None
            }
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_link(&self, short_code: &str) -> CacheResult<Option<CachedLink>> {
        let key = Self::url_key(short_code);
        let mut conn = self.client.clone();

        let raw = self
            .run("GET", &key, conn.get::<_, Option<String>>(&key))
            .await
            .flatten();

        let Some(raw) = raw else {
            debug!("Cache MISS: {}", short_code);
            return Ok(None);
        };

        match serde_json::from_str::<CachedLink>(&raw) {
            Ok(projection) => {
                debug!("Cache HIT: {}", short_code);
                Ok(Some(projection))
            }
            Err(e) => {
                // Unreadable entries are treated as misses and dropped.
                warn!("Discarding malformed cache entry for {}: {}", short_code, e);
                let _ = self.invalidate(short_code).await;
                Ok(None)
            }
        }
    }

    async fn put_link(
        &self,
        short_code: &str,
        projection: &CachedLink,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let key = Self::url_key(short_code);
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        let payload = match serde_json::to_string(projection) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize cache entry for {}: {}", short_code, e);
                return Ok(());
            }
        };

        let mut conn = self.client.clone();
        if self
            .run("SET", &key, conn.set_ex::<_, _, ()>(&key, payload, ttl))
            .await
            .is_some()
        {
            debug!("Cache SET: {} (TTL: {}s)", short_code, ttl);
        }

        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let key = Self::url_key(short_code);
        let mut conn = self.client.clone();

        if let Some(deleted) = self.run("DEL", &key, conn.del::<_, i32>(&key)).await
            && deleted > 0
        {
            debug!("Cache INVALIDATE: {}", short_code);
        }

        Ok(())
    }

    async fn increment_click_counter(&self, short_code: &str) -> CacheResult<i64> {
        let key = Self::clicks_key(short_code);
        let mut conn = self.client.clone();

        let Some(count) = self.run("INCR", &key, conn.incr::<_, _, i64>(&key, 1)).await else {
            return Ok(0);
        };

        let mut conn = self.client.clone();
        let _ = self
            .run(
                "EXPIRE",
                &key,
                conn.expire::<_, ()>(&key, CLICK_COUNTER_TTL_SECS),
            )
            .await;

        Ok(count)
    }

    async fn get_click_counter(&self, short_code: &str) -> CacheResult<i64> {
        let key = Self::clicks_key(short_code);
        let mut conn = self.client.clone();

        let count = self
            .run("GET", &key, conn.get::<_, Option<i64>>(&key))
            .await
            .flatten()
            .unwrap_or(0);

        Ok(count)
    }

    async fn check_rate(
        &self,
        identifier: &str,
        limit: i64,
        window_secs: i64,
    ) -> CacheResult<RateDecision> {
        let key = Self::rate_key(identifier);
        let mut conn = self.client.clone();

        let Some(current) = self.run("INCR", &key, conn.incr::<_, _, i64>(&key, 1)).await else {
            return Ok(RateDecision::allow_all(limit));
        };

        // The counter expires with its window; the key creation sets it.
        if current == 1 {
            let mut conn = self.client.clone();
            let _ = self
                .run("EXPIRE", &key, conn.expire::<_, ()>(&key, window_secs))
                .await;
        }

        Ok(RateDecision {
            allowed: current <= limit,
            remaining: (limit - current).max(0),
        })
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        matches!(
            tokio::time::timeout(self.op_timeout, conn.ping::<()>()).await,
            Ok(Ok(()))
        )
    }
}
