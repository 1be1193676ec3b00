//! Caching layer for fast resolution lookups, click counter hints, and
//! rate-limit counters.
//!
//! Provides a [`CacheService`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`NullCache`] - No-op implementation for testing/disabled caching
//!
//! Every operation is best-effort: when the backend is unreachable the
//! system stays correct, only slower, without a cache.

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService, CachedLink, RateDecision};
