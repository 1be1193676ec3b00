//! Handlers for authenticated link management.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{
    AnalyticsResponse, CreateUrlRequest, LinkListResponse, LinkResponse, ListQuery, PaginationInfo,
};
use crate::api::middleware::auth::AuthUser;
use crate::application::services::CreateLinkSpec;
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Creates a link with the full feature set: expiry, password, reference.
///
/// # Endpoint
///
/// `POST /api/urls` (Bearer token required)
///
/// # Errors
///
/// Returns 400 on validation failure (including a non-future expiry) and
/// 409 when the custom alias is taken.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_link(CreateLinkSpec {
            original_url: payload.original_url,
            custom_alias: payload.custom_alias,
            expires_at: payload.expires_at,
            password: payload.password,
            platform_reference: payload.platform_reference,
            owner_id: Some(owner_id),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_link(&link, &state.base_url)),
    ))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/urls?page=1&limit=20` (Bearer token required)
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<LinkListResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let links = state.link_service.list_links(owner_id, page, limit).await?;

    let has_more = links.len() as i64 == limit;

    Ok(Json(LinkListResponse {
        links: links
            .iter()
            .map(|link| LinkResponse::from_link(link, &state.base_url))
            .collect(),
        pagination: PaginationInfo {
            page,
            limit,
            has_more,
        },
    }))
}

/// Returns analytics for one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/urls/{code}/analytics` (Bearer token required)
///
/// `click_count` is the store's authoritative counter; `recent_clicks` is
/// the ephemeral cache hint, 0 when the cache is unavailable.
pub async fn analytics_handler(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let (link, recent_clicks) = state.link_service.link_analytics(&code, owner_id).await?;

    Ok(Json(AnalyticsResponse {
        short_code: link.short_code,
        original_url: link.original_url,
        click_count: link.click_count,
        recent_clicks,
        created_at: link.created_at,
        expires_at: link.expires_at,
        platform_reference: link.platform_reference,
    }))
}

/// Deletes one of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/urls/{code}` (Bearer token required)
///
/// The cache entry is invalidated synchronously before the response, so
/// the link is immediately unresolvable.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(&code, owner_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
