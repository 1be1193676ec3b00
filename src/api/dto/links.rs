//! DTOs for authenticated link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::shorten::CUSTOM_ALIAS_REGEX;
use crate::domain::entities::Link;

/// Full-featured link creation request (authenticated endpoint).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    /// The destination URL (must be a well-formed absolute HTTP/HTTPS URL).
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub original_url: String,

    /// Optional custom alias (validated for length and characters).
    #[validate(length(min = 3, max = 50))]
    #[validate(regex(path = "*CUSTOM_ALIAS_REGEX"))]
    pub custom_alias: Option<String>,

    /// Optional expiry; must be strictly in the future.
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional password protecting the link.
    #[validate(length(min = 4, max = 50))]
    pub password: Option<String>,

    /// Optional caller-side reference tag.
    #[validate(length(max = 100))]
    pub platform_reference: Option<String>,
}

/// Projection of a link returned to its owner.
///
/// Exposes `has_password` instead of the hash itself.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub custom_alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub has_password: bool,
    pub click_count: i64,
    pub platform_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn from_link(link: &Link, base_url: &str) -> Self {
        Self {
            id: link.id,
            short_code: link.short_code.clone(),
            short_url: build_short_url(base_url, &link.short_code),
            original_url: link.original_url.clone(),
            custom_alias: link.custom_alias.clone(),
            expires_at: link.expires_at,
            has_password: link.is_password_protected(),
            click_count: link.click_count,
            platform_reference: link.platform_reference.clone(),
            created_at: link.created_at,
        }
    }
}

/// Pagination query for the owner's link listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated listing of the owner's links.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub links: Vec<LinkResponse>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

/// Per-link analytics for the owner.
///
/// `click_count` is the store's authoritative counter; `recent_clicks` is
/// the ephemeral cache hint and may lag or reset.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub short_code: String,
    pub original_url: String,
    pub click_count: i64,
    pub recent_clicks: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub platform_reference: Option<String>,
}

/// Builds the public short URL for a code.
pub fn build_short_url(base_url: &str, code: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), code)
}
