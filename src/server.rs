//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum
//! server lifecycle.

use crate::api::middleware::rate_limit::{RateLimits, RatePolicy};
use crate::application::services::{AuthService, LinkService, ResolveService};
use crate::config::Config;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::{LinkRepository, TokenRepository};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgLinkRepository, PgTokenRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool with bounded size and idle reclamation
/// - Migrations
/// - Redis cache (or NullCache fallback)
/// - Background click worker
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if the database connection, bind, or server runtime
/// fails. A failed Redis connection is not an error: the service starts
/// with caching disabled.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let cache: Arc<dyn CacheService> = if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(
            redis_url,
            config.cache_ttl_seconds,
            config.cache_op_timeout_ms,
        )
        .await
        {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    };

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let token_repository: Arc<dyn TokenRepository> = Arc::new(PgTokenRepository::new(pool.clone()));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    tokio::spawn(run_click_worker(
        click_rx,
        link_repository.clone(),
        cache.clone(),
    ));
    tracing::info!("Click worker started");

    let state = AppState {
        link_service: Arc::new(LinkService::new(link_repository.clone(), cache.clone())),
        resolve_service: Arc::new(ResolveService::new(
            link_repository,
            cache.clone(),
            click_tx.clone(),
        )),
        auth_service: Arc::new(AuthService::new(
            token_repository,
            config.token_signing_secret.clone(),
        )),
        cache,
        click_tx,
        base_url: config.base_url.clone(),
        limits: RateLimits {
            general: RatePolicy {
                scope: "general",
                max: config.rate_limit_max,
                window_secs: config.rate_limit_window_secs,
            },
            create: RatePolicy {
                scope: "create",
                max: config.create_rate_limit_max,
                window_secs: config.create_rate_limit_window_secs,
            },
            auth: RatePolicy {
                scope: "auth",
                max: config.auth_rate_limit_max,
                window_secs: config.auth_rate_limit_window_secs,
            },
            behind_proxy: config.behind_proxy,
        },
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}
