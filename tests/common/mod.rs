#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use snaplink::api::middleware::rate_limit::{RateLimits, RatePolicy};
use snaplink::application::services::{AuthService, LinkService, ResolveService};
use snaplink::domain::click_event::ClickEvent;
use snaplink::domain::entities::{Link, NewLink};
use snaplink::domain::repositories::{LinkRepository, TokenRepository};
use snaplink::error::AppError;
use snaplink::infrastructure::cache::{
    CacheResult, CacheService, CachedLink, RateDecision,
};
use snaplink::state::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub const TEST_SECRET: &str = "test-signing-secret";
pub const TEST_TOKEN: &str = "owner-token";
pub const TEST_USER_ID: i64 = 1;
pub const OTHER_TOKEN: &str = "other-token";
pub const OTHER_USER_ID: i64 = 2;

/// In-memory link store mirroring the Postgres repository's semantics:
/// unique constraints on code and alias, atomic counter increment.
pub struct MemoryLinkRepository {
    links: Mutex<Vec<Link>>,
    next_id: Mutex<i64>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    pub fn insert_link(&self, new_link: NewLink) -> Link {
        insert_unchecked(self, new_link)
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    pub fn get(&self, code: &str) -> Option<Link> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.short_code == code)
            .cloned()
    }
}

fn insert_unchecked(repo: &MemoryLinkRepository, new_link: NewLink) -> Link {
    let mut links = repo.links.lock().unwrap();
    let mut next_id = repo.next_id.lock().unwrap();

    let link = Link {
        id: *next_id,
        short_code: new_link.short_code,
        custom_alias: new_link.custom_alias,
        original_url: new_link.original_url,
        expires_at: new_link.expires_at,
        password_hash: new_link.password_hash,
        click_count: 0,
        platform_reference: new_link.platform_reference,
        owner_id: new_link.owner_id,
        created_at: Utc::now(),
    };
    *next_id += 1;
    links.push(link.clone());
    link
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        {
            let links = self.links.lock().unwrap();

            if links.iter().any(|l| l.short_code == new_link.short_code) {
                return Err(AppError::duplicate_code(
                    "Short code already exists",
                    json!({ "constraint": "urls_short_code_key" }),
                ));
            }

            if new_link.custom_alias.is_some()
                && links.iter().any(|l| l.custom_alias == new_link.custom_alias)
            {
                return Err(AppError::duplicate_alias(
                    "Custom alias already exists",
                    json!({ "constraint": "urls_custom_alias_key" }),
                ));
            }
        }

        Ok(insert_unchecked(self, new_link))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.get(code))
    }

    async fn find_by_owner(
        &self,
        owner_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        let links = self.links.lock().unwrap();
        let mut owned: Vec<Link> = links
            .iter()
            .filter(|l| l.owner_id == Some(owner_id))
            .cloned()
            .collect();
        owned.reverse(); // newest first

        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn increment_clicks(&self, id: i64) -> Result<i64, AppError> {
        let mut links = self.links.lock().unwrap();
        let link = links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        link.click_count += 1;
        Ok(link.click_count)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.id != id);
        Ok(links.len() < before)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// In-memory token store seeded with two users.
pub struct MemoryTokenRepository {
    tokens: Mutex<HashMap<String, i64>>,
}

impl MemoryTokenRepository {
    pub fn seeded() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token_hash(TEST_SECRET, TEST_TOKEN), TEST_USER_ID);
        tokens.insert(token_hash(TEST_SECRET, OTHER_TOKEN), OTHER_USER_ID);
        Self {
            tokens: Mutex::new(tokens),
        }
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        Ok(self.tokens.lock().unwrap().get(token_hash).copied())
    }
}

/// Computes the HMAC-SHA256 hex digest the auth service stores and looks up.
pub fn token_hash(secret: &str, token: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// In-memory cache honoring rate-limit windows via wall-clock instants.
/// Link projection TTLs are ignored; tests control entries directly.
pub struct MemoryCache {
    pub links: Mutex<HashMap<String, CachedLink>>,
    pub clicks: Mutex<HashMap<String, i64>>,
    pub rates: Mutex<HashMap<String, (i64, Instant)>>,
    pub invalidations: Mutex<Vec<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(HashMap::new()),
            clicks: Mutex::new(HashMap::new()),
            rates: Mutex::new(HashMap::new()),
            invalidations: Mutex::new(Vec::new()),
        }
    }

    pub fn cached_entry(&self, code: &str) -> Option<CachedLink> {
        self.links.lock().unwrap().get(code).cloned()
    }

    pub fn seed_entry(&self, code: &str, projection: CachedLink) {
        self.links
            .lock()
            .unwrap()
            .insert(code.to_string(), projection);
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_link(&self, short_code: &str) -> CacheResult<Option<CachedLink>> {
        Ok(self.links.lock().unwrap().get(short_code).cloned())
    }

    async fn put_link(
        &self,
        short_code: &str,
        projection: &CachedLink,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        self.links
            .lock()
            .unwrap()
            .insert(short_code.to_string(), projection.clone());
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        self.links.lock().unwrap().remove(short_code);
        self.invalidations
            .lock()
            .unwrap()
            .push(short_code.to_string());
        Ok(())
    }

    async fn increment_click_counter(&self, short_code: &str) -> CacheResult<i64> {
        let mut clicks = self.clicks.lock().unwrap();
        let count = clicks.entry(short_code.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn get_click_counter(&self, short_code: &str) -> CacheResult<i64> {
        Ok(self
            .clicks
            .lock()
            .unwrap()
            .get(short_code)
            .copied()
            .unwrap_or(0))
    }

    async fn check_rate(
        &self,
        identifier: &str,
        limit: i64,
        window_secs: i64,
    ) -> CacheResult<RateDecision> {
        let mut rates = self.rates.lock().unwrap();
        let now = Instant::now();

        let entry = rates
            .entry(identifier.to_string())
            .or_insert((0, now + Duration::from_secs(window_secs as u64)));

        // Window expired: the counter resets as if the key had expired.
        if now >= entry.1 {
            *entry = (0, now + Duration::from_secs(window_secs as u64));
        }

        entry.0 += 1;

        Ok(RateDecision {
            allowed: entry.0 <= limit,
            remaining: (limit - entry.0).max(0),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub fn default_limits() -> RateLimits {
    RateLimits {
        general: RatePolicy {
            scope: "general",
            max: 100,
            window_secs: 900,
        },
        create: RatePolicy {
            scope: "create",
            max: 100,
            window_secs: 60,
        },
        auth: RatePolicy {
            scope: "auth",
            max: 5,
            window_secs: 900,
        },
        behind_proxy: false,
    }
}

/// Everything a handler test needs: the state plus direct handles on the
/// fakes behind it.
pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<MemoryLinkRepository>,
    pub cache: Arc<MemoryCache>,
    pub click_rx: mpsc::Receiver<ClickEvent>,
}

pub fn test_context() -> TestContext {
    test_context_with_limits(default_limits())
}

pub fn test_context_with_limits(limits: RateLimits) -> TestContext {
    let repo = Arc::new(MemoryLinkRepository::new());
    let cache = Arc::new(MemoryCache::new());

    let (state, click_rx) = build_state(repo.clone(), cache.clone(), limits);

    TestContext {
        state,
        repo,
        cache,
        click_rx,
    }
}

pub fn build_state(
    repo: Arc<MemoryLinkRepository>,
    cache: Arc<dyn CacheService>,
    limits: RateLimits,
) -> (AppState, mpsc::Receiver<ClickEvent>) {
    let (click_tx, click_rx) = mpsc::channel(100);

    let link_repo: Arc<dyn LinkRepository> = repo;
    let token_repo: Arc<dyn TokenRepository> = Arc::new(MemoryTokenRepository::seeded());

    let state = AppState {
        link_service: Arc::new(LinkService::new(link_repo.clone(), cache.clone())),
        resolve_service: Arc::new(ResolveService::new(
            link_repo,
            cache.clone(),
            click_tx.clone(),
        )),
        auth_service: Arc::new(AuthService::new(token_repo, TEST_SECRET.to_string())),
        cache,
        click_tx,
        base_url: "http://s.test".to_string(),
        limits,
    };

    (state, click_rx)
}

/// Inserts a plain link straight into the store, bypassing the service.
pub fn seed_link(repo: &MemoryLinkRepository, code: &str, url: &str) -> Link {
    repo.insert_link(NewLink {
        short_code: code.to_string(),
        custom_alias: None,
        original_url: url.to_string(),
        expires_at: None,
        password_hash: None,
        platform_reference: None,
        owner_id: None,
    })
}
