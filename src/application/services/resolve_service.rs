//! Cache-aside resolution engine with request-scoped policy checks.
//!
//! A resolution consults the cache first, falls back to the authoritative
//! store on a miss, evaluates expiry and password policies against data
//! freshly sourced from whichever layer answered, and schedules click
//! accounting without blocking the response.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedLink};
use crate::utils::password::verify_password;

/// Successful resolution outcome: the destination to redirect to.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub destination: String,
    pub link_id: i64,
}

/// Orchestrates cache-aside lookup, policy evaluation, and click accounting.
///
/// Password verification never trusts the cache: the projection only says
/// *whether* a password exists, so a protected link always costs a store
/// read to obtain the hash. Expired links resolve exactly like absent ones.
pub struct ResolveService<R: LinkRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    click_tx: mpsc::Sender<ClickEvent>,
}

impl<R: LinkRepository + ?Sized> ResolveService<R> {
    pub fn new(
        repository: Arc<R>,
        cache: Arc<dyn CacheService>,
        click_tx: mpsc::Sender<ClickEvent>,
    ) -> Self {
        Self {
            repository,
            cache,
            click_tx,
        }
    }

    /// Resolves a short code to its destination URL.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] when the code is absent or the link has
    ///   expired; the two cases produce identical responses
    /// - [`AppError::PasswordRequired`] when the link is protected and no
    ///   password was supplied
    /// - [`AppError::Forbidden`] when the supplied password is wrong
    /// - [`AppError::Internal`] when the store is unreachable
    pub async fn resolve(
        &self,
        code: &str,
        password: Option<&str>,
    ) -> Result<Resolution, AppError> {
        let cached = match self.cache.get_link(code).await {
            Ok(cached) => cached,
            Err(e) => {
                error!("Cache error for {}: {}", code, e);
                None
            }
        };

        let (projection, store_link) = match cached {
            Some(projection) if projection.has_password => {
                // The cache never substitutes for password checking; fetch
                // the hash from the store. An absent row means the link was
                // deleted after being cached.
                match self.repository.find_by_code(code).await? {
                    Some(link) => (CachedLink::from(&link), Some(link)),
                    None => {
                        let _ = self.cache.invalidate(code).await;
                        return Err(link_not_found(code));
                    }
                }
            }
            Some(projection) => (projection, None),
            None => {
                let Some(link) = self.repository.find_by_code(code).await? else {
                    return Err(link_not_found(code));
                };

                let projection = CachedLink::from(&link);
                self.write_back(code, &projection);

                (projection, Some(link))
            }
        };

        // Expired links are indistinguishable from absent ones.
        if projection.is_expired() {
            return Err(link_not_found(code));
        }

        if projection.has_password {
            self.verify_link_password(code, store_link.as_ref(), password)?;
        }

        // Fire-and-forget click accounting; a full queue drops the event.
        if self
            .click_tx
            .try_send(ClickEvent::new(projection.id, code))
            .is_err()
        {
            debug!("Click queue full, dropping click for {}", code);
        }

        Ok(Resolution {
            destination: projection.original_url,
            link_id: projection.id,
        })
    }

    /// Writes a fresh projection back to the cache without blocking the
    /// response. A failed write only shows up in logs.
    fn write_back(&self, code: &str, projection: &CachedLink) {
        let cache = Arc::clone(&self.cache);
        let code = code.to_string();
        let projection = projection.clone();

        tokio::spawn(async move {
            if let Err(e) = cache.put_link(&code, &projection, None).await {
                error!("Failed to cache link {}: {}", code, e);
            }
        });
    }

    /// Verifies the supplied password against the store-sourced hash.
    fn verify_link_password(
        &self,
        code: &str,
        store_link: Option<&Link>,
        password: Option<&str>,
    ) -> Result<(), AppError> {
        let Some(password) = password else {
            return Err(AppError::password_required());
        };

        let hash = store_link
            .and_then(|link| link.password_hash.as_deref())
            .ok_or_else(|| {
                AppError::internal("Password hash unavailable", json!({ "code": code }))
            })?;

        let valid = verify_password(password, hash).map_err(|e| {
            AppError::internal("Password verification failed", json!({ "reason": e.to_string() }))
        })?;

        if !valid {
            return Err(AppError::forbidden("Invalid password", json!({})));
        }

        Ok(())
    }
}

fn link_not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{CacheResult, NullCache, RateDecision};
    use crate::utils::password::hash_password;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    fn store_link(id: i64, code: &str, url: &str) -> Link {
        Link {
            id,
            short_code: code.to_string(),
            custom_alias: None,
            original_url: url.to_string(),
            expires_at: None,
            password_hash: None,
            click_count: 0,
            platform_reference: None,
            owner_id: None,
            created_at: Utc::now(),
        }
    }

    /// Cache double pre-loaded with one projection.
    struct FixedCache {
        entry: Option<CachedLink>,
        invalidated: Mutex<Vec<String>>,
    }

    impl FixedCache {
        fn with_entry(entry: CachedLink) -> Self {
            Self {
                entry: Some(entry),
                invalidated: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CacheService for FixedCache {
        async fn get_link(&self, _short_code: &str) -> CacheResult<Option<CachedLink>> {
            Ok(self.entry.clone())
        }

        async fn put_link(
            &self,
            _short_code: &str,
            _projection: &CachedLink,
            _ttl_seconds: Option<u64>,
        ) -> CacheResult<()> {
            Ok(())
        }

        async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
            self.invalidated
                .lock()
                .unwrap()
                .push(short_code.to_string());
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

    fn service_with(
        repo: MockLinkRepository,
        cache: Arc<dyn CacheService>,
    ) -> (
        ResolveService<MockLinkRepository>,
        mpsc::Receiver<ClickEvent>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        (ResolveService::new(Arc::new(repo), cache, tx), rx)
    }

    #[tokio::test]
    async fn test_resolve_miss_reads_store_and_redirects() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .withf(|code| code == "target12")
            .times(1)
            .returning(|code| Ok(Some(store_link(1, code, "https://example.com/a/b"))));

        let (service, mut rx) = service_with(mock_repo, Arc::new(NullCache::new()));

        let resolution = service.resolve("target12", None).await.unwrap();

        assert_eq!(resolution.destination, "https://example.com/a/b");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.link_id, 1);
        assert_eq!(event.short_code, "target12");
    }

    #[tokio::test]
    async fn test_resolve_absent_is_not_found() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(None));

        let (service, mut rx) = service_with(mock_repo, Arc::new(NullCache::new()));

        let err = service.resolve("missing1", None).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_expired_matches_absent() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(1).returning(|code| {
            Ok(Some(Link {
                expires_at: Some(Utc::now() - Duration::seconds(1)),
                ..store_link(2, code, "https://example.com")
            }))
        });

        let (service, mut rx) = service_with(mock_repo, Arc::new(NullCache::new()));

        let expired = service.resolve("expired1", None).await.unwrap_err();

        // Same error kind and code as a link that never existed.
        assert!(matches!(expired, AppError::NotFound { .. }));
        assert_eq!(expired.code(), "not_found");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_skips_store() {
        let mock_repo = MockLinkRepository::new();

        let cache = FixedCache::with_entry(CachedLink {
            original_url: "https://cached.example.com".to_string(),
            expires_at: None,
            has_password: false,
            id: 3,
        });

        let (service, mut rx) = service_with(mock_repo, Arc::new(cache));

        let resolution = service.resolve("cached12", None).await.unwrap();

        assert_eq!(resolution.destination, "https://cached.example.com");
        assert_eq!(rx.try_recv().unwrap().link_id, 3);
    }

    #[tokio::test]
    async fn test_resolve_protected_hit_still_reads_store() {
        let hash = hash_password("open-sesame").unwrap();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(1).returning(move |code| {
            Ok(Some(Link {
                password_hash: Some(hash.clone()),
                ..store_link(4, code, "https://secret.example.com")
            }))
        });

        let cache = FixedCache::with_entry(CachedLink {
            original_url: "https://secret.example.com".to_string(),
            expires_at: None,
            has_password: true,
            id: 4,
        });

        let (service, _rx) = service_with(mock_repo, Arc::new(cache));

        let resolution = service.resolve("locked12", Some("open-sesame")).await.unwrap();

        assert_eq!(resolution.destination, "https://secret.example.com");
    }

    #[tokio::test]
    async fn test_resolve_protected_without_password() {
        let hash = hash_password("open-sesame").unwrap();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(1).returning(move |code| {
            Ok(Some(Link {
                password_hash: Some(hash.clone()),
                ..store_link(5, code, "https://secret.example.com")
            }))
        });

        let (service, mut rx) = service_with(mock_repo, Arc::new(NullCache::new()));

        let err = service.resolve("locked12", None).await.unwrap_err();

        assert!(matches!(err, AppError::PasswordRequired { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_protected_with_wrong_password() {
        let hash = hash_password("open-sesame").unwrap();

        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(1).returning(move |code| {
            Ok(Some(Link {
                password_hash: Some(hash.clone()),
                ..store_link(6, code, "https://secret.example.com")
            }))
        });

        let (service, mut rx) = service_with(mock_repo, Arc::new(NullCache::new()));

        let err = service.resolve("locked12", Some("guess")).await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resolve_stale_protected_hit_after_delete() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .times(1)
            .returning(|_| Ok(None));

        let cache = Arc::new(FixedCache::with_entry(CachedLink {
            original_url: "https://gone.example.com".to_string(),
            expires_at: None,
            has_password: true,
            id: 7,
        }));

        let (service, _rx) = service_with(mock_repo, cache.clone());

        let err = service.resolve("stale123", Some("pw")).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        // The stale entry was dropped, not served.
        assert_eq!(*cache.invalidated.lock().unwrap(), vec!["stale123"]);
    }
}
