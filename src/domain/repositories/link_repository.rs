//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the authoritative link store.
///
/// The store exclusively owns durable link state: uniqueness of codes and
/// aliases, existence/deletion, and the ground-truth click counter.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link as a single atomic insert.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateCode`] when the generated short code
    /// collides (callers retry generation), [`AppError::DuplicateAlias`]
    /// when a user-chosen alias is taken (callers reject), and
    /// [`AppError::Internal`] on other database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Lists links owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_owner(
        &self,
        owner_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError>;

    /// Atomically advances the click counter by one, returning the new count.
    ///
    /// Safe under concurrent increments from simultaneous redirects of the
    /// same link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link no longer exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_clicks(&self, id: i64) -> Result<i64, AppError>;

    /// Deletes a link. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Verifies store connectivity. Used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
