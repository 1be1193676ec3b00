//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`  - Short link resolution (public, general rate limit)
//! - `GET  /health`  - Health check: DB, cache, click queue (public)
//! - `/api/*`        - Creation and management endpoints
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Cache-backed fixed-window counters per client IP
//! - **Authentication** - Bearer token on management endpoints
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// The rate limiter gates the redirect path before the resolution engine
/// runs; the health endpoint is deliberately unthrottled.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let redirect_routes = Router::new()
        .route("/{code}", get(redirect_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::general,
        ));

    let router = Router::new()
        .merge(redirect_routes)
        .route("/health", get(health_handler))
        .nest("/api", api::routes::api_routes(state.clone()))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
