//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without business logic. Creation
//! uses a separate `NewLink` struct following the "New Type" pattern.

pub mod link;

pub use link::{Link, NewLink};
