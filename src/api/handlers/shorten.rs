//! Handler for the public link shortening endpoint.

use axum::{Extension, Json, extract::State};
use validator::Validate;

use crate::api::dto::links::build_short_url;
use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::auth::AuthUser;
use crate::application::services::CreateLinkSpec;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link from a destination URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// Authentication is optional; when a valid Bearer token is supplied the
/// created link is attached to the caller's account.
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/some/long/path",
///   "custom_alias": "my-alias"   // optional
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request on validation failure and 409 Conflict when the
/// custom alias is already taken.
pub async fn shorten_handler(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_link(CreateLinkSpec {
            original_url: payload.original_url,
            custom_alias: payload.custom_alias,
            owner_id: user.map(|Extension(AuthUser(id))| id),
            ..Default::default()
        })
        .await?;

    Ok(Json(ShortenResponse {
        short_url: build_short_url(&state.base_url, &link.short_code),
        short_code: link.short_code,
        original_url: link.original_url,
    }))
}
