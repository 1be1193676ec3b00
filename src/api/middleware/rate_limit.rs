//! Cache-backed fixed-window rate limiting middleware.
//!
//! Counters live in the cache layer under `rate:{scope}:{ip}` keys: the
//! first request in a window creates an expiring counter, subsequent
//! requests increment it, and requests past the budget receive `429`.
//! When the cache is unavailable the limiter fails open, preferring
//! availability over strict throttling.

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// A fixed-window budget for one endpoint class.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    /// Key namespace, e.g. `"general"` or `"create"`.
    pub scope: &'static str,
    /// Maximum requests per window.
    pub max: i64,
    /// Window length in seconds.
    pub window_secs: i64,
}

/// The per-endpoint-class budgets plus client IP sourcing mode.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    /// General traffic (redirects).
    pub general: RatePolicy,
    /// Link-creation endpoints (tighter).
    pub create: RatePolicy,
    /// Failed authentication attempts on protected endpoints (tightest).
    pub auth: RatePolicy,
    /// When true, the client IP is read from `X-Forwarded-For` / `X-Real-IP`.
    pub behind_proxy: bool,
}

/// Gates general traffic (the redirect path).
pub async fn general(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&req, st.limits.behind_proxy);
    if let Some(denied) = enforce(&st, st.limits.general, &ip).await {
        return Ok(denied);
    }
    Ok(next.run(req).await)
}

/// Gates link-creation endpoints with a tighter window.
pub async fn create(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&req, st.limits.behind_proxy);
    if let Some(denied) = enforce(&st, st.limits.create, &ip).await {
        return Ok(denied);
    }
    Ok(next.run(req).await)
}

/// Checks and advances the counter for a request; `Some` means denied.
async fn enforce(st: &AppState, policy: RatePolicy, ip: &str) -> Option<Response> {
    let identifier = format!("{}:{}", policy.scope, ip);

    let decision = match st
        .cache
        .check_rate(&identifier, policy.max, policy.window_secs)
        .await
    {
        Ok(decision) => decision,
        // Fail open: the cache being down must not take requests with it.
        Err(e) => {
            warn!("Rate limit check failed for {}: {}", identifier, e);
            return None;
        }
    };

    if decision.allowed {
        None
    } else {
        warn!("Rate limit exceeded for {}", identifier);
        Some(too_many_requests())
    }
}

/// Records a failed authentication attempt; `Some` means the caller has
/// exhausted the auth budget and gets `429` instead of `401`.
///
/// Successful authentications are never counted, so the tight budget only
/// throttles token guessing.
pub(crate) async fn note_auth_failure(st: &AppState, ip: &str) -> Option<Response> {
    let identifier = format!("{}:{}", st.limits.auth.scope, ip);

    let decision = st
        .cache
        .check_rate(&identifier, st.limits.auth.max, st.limits.auth.window_secs)
        .await
        .ok()?;

    if decision.allowed {
        None
    } else {
        warn!("Auth rate limit exceeded for {}", identifier);
        Some(too_many_requests())
    }
}

/// Extracts the client IP used as the rate-limit identifier.
///
/// Behind a trusted reverse proxy the forwarded headers are authoritative;
/// otherwise only the peer socket address is trusted.
pub(crate) fn client_ip(req: &Request, behind_proxy: bool) -> String {
    if behind_proxy
        && let Some(ip) = forwarded_ip(req.headers())
    {
        return ip;
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn too_many_requests() -> Response {
    let body = json!({
        "error": {
            "code": "rate_limited",
            "message": "Too many requests, please try again later.",
            "details": {}
        }
    });

    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}
