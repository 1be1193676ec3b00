//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL link with its resolution policies.
///
/// `short_code` is the public token; when the caller supplied a custom
/// alias it is recorded in `custom_alias` and doubles as the code.
/// `click_count` is owned by the store and only ever advanced through
/// [`crate::domain::repositories::LinkRepository::increment_clicks`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub click_count: i64,
    pub platform_reference: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Returns true if resolving this link requires a password.
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input data for creating a new link.
///
/// `password_hash` is already hashed by the time this struct exists;
/// the plaintext never crosses the repository boundary.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub platform_reference: Option<String>,
    pub owner_id: Option<i64>,
}
