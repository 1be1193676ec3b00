//! DTOs for the public link shortening endpoint.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

/// Compiled regex for custom alias validation.
pub(crate) static CUSTOM_ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Request to shorten a URL, optionally under a caller-chosen alias.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The destination URL (must be a well-formed absolute HTTP/HTTPS URL).
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub original_url: String,

    /// Optional custom alias (validated for length and characters).
    #[validate(length(min = 3, max = 50))]
    #[validate(regex(path = "*CUSTOM_ALIAS_REGEX"))]
    pub custom_alias: Option<String>,
}

/// Response for a successfully shortened URL.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
}
