//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::api::middleware::rate_limit;
use crate::{error::AppError, state::AppState};

/// Authenticated caller identity attached to the request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Requires a valid Bearer token; inserts [`AuthUser`] into extensions.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Failed attempts are counted against the tight auth rate budget; once
/// that budget is exhausted the caller receives `429` instead of `401`.
/// Successful authentications are never counted.
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is missing, malformed, or the
/// token resolves to no user.
pub async fn require(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let bearer = AuthBearer::from_request_parts(&mut parts, &()).await;

    let mut req = Request::from_parts(parts, body);
    let ip = rate_limit::client_ip(&req, st.limits.behind_proxy);

    let token = match bearer {
        Ok(AuthBearer(token)) => token,
        Err(_) => {
            return auth_failed(
                &st,
                &ip,
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "Authorization header is missing or invalid" }),
                ),
            )
            .await;
        }
    };

    match st.auth_service.authenticate(&token).await {
        Ok(user_id) => {
            req.extensions_mut().insert(AuthUser(user_id));
            Ok(next.run(req).await)
        }
        Err(e) => auth_failed(&st, &ip, e).await,
    }
}

/// Attaches [`AuthUser`] when a valid token is present, otherwise
/// continues anonymously. Used by the public shorten endpoint to record
/// ownership opportunistically.
pub async fn optional(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let bearer = AuthBearer::from_request_parts(&mut parts, &()).await;

    let mut req = Request::from_parts(parts, body);

    if let Ok(AuthBearer(token)) = bearer
        && let Ok(user_id) = st.auth_service.authenticate(&token).await
    {
        req.extensions_mut().insert(AuthUser(user_id));
    }

    next.run(req).await
}

async fn auth_failed(
    st: &AppState,
    ip: &str,
    err: AppError,
) -> Result<Response, AppError> {
    if let Some(denied) = rate_limit::note_auth_failure(st, ip).await {
        return Ok(denied);
    }
    Err(err)
}
