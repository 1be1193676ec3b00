//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Authoritative link storage and click accounting
//! - [`PgTokenRepository`] - Identity token lookups

pub mod pg_link_repository;
pub mod pg_token_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_token_repository::PgTokenRepository;
