//! Handler for short URL resolution.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Optional password supplied with a resolution request.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub password: Option<String>,
}

/// Resolves a short code and redirects to its destination.
///
/// # Endpoint
///
/// `GET /{code}?password=...`
///
/// # Request Flow
///
/// 1. Consult the cache for the link projection
/// 2. On miss, read the authoritative store and write the projection back
/// 3. Evaluate expiry and password policies on the freshly sourced data
/// 4. Queue click accounting without blocking the response
/// 5. Return `307 Temporary Redirect`
///
/// # Errors
///
/// - `404` when the code is absent or the link expired (identical bodies)
/// - `401` with code `password_required` when protected and no password given
/// - `403` when the supplied password is wrong
pub async fn redirect_handler(
    Path(code): Path<String>,
    Query(query): Query<RedirectQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let resolution = state
        .resolve_service
        .resolve(&code, query.password.as_deref())
        .await?;

    Ok(Redirect::temporary(&resolution.destination))
}
