//! Link creation, listing, deletion, and analytics service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;
use url::Url;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedLink};
use crate::utils::code_generator::{generate_code, validate_custom_alias};
use crate::utils::password::hash_password;

/// Attempts at generating a collision-free code before giving up.
const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Longest accepted destination URL.
const MAX_URL_LENGTH: usize = 2048;

/// Input for creating a short link.
///
/// `password` is plaintext here and nowhere else; it is hashed before a
/// [`NewLink`] is constructed.
#[derive(Debug, Clone, Default)]
pub struct CreateLinkSpec {
    pub original_url: String,
    pub custom_alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub password: Option<String>,
    pub platform_reference: Option<String>,
    pub owner_id: Option<i64>,
}

/// Service for creating and managing shortened links.
///
/// Creation goes through the store's uniqueness constraint: generated
/// codes are retried on collision, user-chosen aliases surface the
/// conflict to the caller. Deletion invalidates the cache entry
/// synchronously so a deleted link is never served from a stale hit.
pub struct LinkService<R: LinkRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
}

impl<R: LinkRepository + ?Sized> LinkService<R> {
    pub fn new(repository: Arc<R>, cache: Arc<dyn CacheService>) -> Self {
        Self { repository, cache }
    }

    /// Creates a short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is malformed, the alias
    /// is invalid, or the expiry is not in the future.
    /// Returns [`AppError::DuplicateAlias`] if the custom alias is taken.
    /// Returns [`AppError::Internal`] if code generation keeps colliding
    /// or the store fails.
    pub async fn create_link(&self, mut spec: CreateLinkSpec) -> Result<Link, AppError> {
        validate_original_url(&spec.original_url)?;

        if let Some(expires_at) = spec.expires_at
            && expires_at <= Utc::now()
        {
            return Err(AppError::bad_request(
                "Expiration date must be in the future",
                json!({ "expires_at": expires_at }),
            ));
        }

        let password_hash = match spec.password.as_deref() {
            Some(password) => Some(hash_password(password).map_err(|e| {
                AppError::internal("Failed to hash password", json!({ "reason": e.to_string() }))
            })?),
            None => None,
        };

        let link = if let Some(alias) = spec.custom_alias.take() {
            validate_custom_alias(&alias)?;

            // The alias doubles as the code; a taken alias surfaces as-is.
            self.repository
                .create(NewLink {
                    short_code: alias.clone(),
                    custom_alias: Some(alias),
                    original_url: spec.original_url,
                    expires_at: spec.expires_at,
                    password_hash,
                    platform_reference: spec.platform_reference,
                    owner_id: spec.owner_id,
                })
                .await
                .map_err(|e| match e {
                    // The alias collided on the code column of another link.
                    AppError::DuplicateCode { details, .. } => {
                        AppError::duplicate_alias("Custom alias already exists", details)
                    }
                    other => other,
                })?
        } else {
            self.create_with_generated_code(&spec, password_hash)
                .await?
        };

        // Warm the cache so the first resolution is already a hit.
        let projection = CachedLink::from(&link);
        if let Err(e) = self
            .cache
            .put_link(&link.short_code, &projection, None)
            .await
        {
            warn!("Failed to warm cache for {}: {}", link.short_code, e);
        }

        Ok(link)
    }

    /// Inserts with a freshly generated code, retrying on collision.
    async fn create_with_generated_code(
        &self,
        spec: &CreateLinkSpec,
        password_hash: Option<String>,
    ) -> Result<Link, AppError> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let new_link = NewLink {
                short_code: generate_code(),
                custom_alias: None,
                original_url: spec.original_url.clone(),
                expires_at: spec.expires_at,
                password_hash: password_hash.clone(),
                platform_reference: spec.platform_reference.clone(),
                owner_id: spec.owner_id,
            };

            match self.repository.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::DuplicateCode { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    /// Lists links owned by a user, newest first.
    pub async fn list_links(
        &self,
        owner_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError> {
        let offset = (page - 1) * limit;
        self.repository.find_by_owner(owner_id, limit, offset).await
    }

    /// Fetches a link and verifies the caller owns it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code does not exist and
    /// [`AppError::Forbidden`] if it belongs to someone else.
    pub async fn get_owned_link(&self, code: &str, owner_id: i64) -> Result<Link, AppError> {
        let link = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        if link.owner_id != Some(owner_id) {
            return Err(AppError::forbidden("Access denied", json!({ "code": code })));
        }

        Ok(link)
    }

    /// Returns a link with the ephemeral recent-clicks hint from the cache.
    ///
    /// The `click_count` on the returned link is the store's authoritative
    /// count; the second value is the cache counter, 0 when unavailable.
    pub async fn link_analytics(&self, code: &str, owner_id: i64) -> Result<(Link, i64), AppError> {
        let link = self.get_owned_link(code, owner_id).await?;

        let recent_clicks = self
            .cache
            .get_click_counter(&link.short_code)
            .await
            .unwrap_or(0);

        Ok((link, recent_clicks))
    }

    /// Deletes a link and synchronously invalidates its cache entry.
    ///
    /// The invalidation completes before this method returns; TTL expiry
    /// is never relied on for deletion.
    pub async fn delete_link(&self, code: &str, owner_id: i64) -> Result<(), AppError> {
        let link = self.get_owned_link(code, owner_id).await?;

        self.repository.delete(link.id).await?;

        if let Err(e) = self.cache.invalidate(&link.short_code).await {
            warn!(
                "Failed to invalidate cache for deleted link {}: {}",
                link.short_code, e
            );
        }

        Ok(())
    }

    /// Verifies store connectivity. Used by the health endpoint.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}

/// Rejects destinations that are not well-formed absolute HTTP(S) URLs.
fn validate_original_url(original_url: &str) -> Result<(), AppError> {
    if original_url.len() > MAX_URL_LENGTH {
        return Err(AppError::bad_request(
            "URL is too long",
            json!({ "max_length": MAX_URL_LENGTH }),
        ));
    }

    let parsed = Url::parse(original_url)
        .map_err(|e| AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() })))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::bad_request(
            "URL must use http or https",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    Ok(())
}
