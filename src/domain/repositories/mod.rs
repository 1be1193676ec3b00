//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are
//! auto-generated via `mockall` for unit tests.

pub mod link_repository;
pub mod token_repository;

pub use link_repository::LinkRepository;
pub use token_repository::TokenRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
