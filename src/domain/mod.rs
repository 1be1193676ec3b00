//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces, and the click accounting
//! pipeline independent of HTTP and storage concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click accounting event model
//! - [`click_worker`] - Asynchronous click accounting worker
//!
//! # Click Accounting Flow
//!
//! 1. The resolution engine completes a redirect
//! 2. A [`click_event::ClickEvent`] is sent to a bounded channel (non-blocking)
//! 3. [`click_worker::run_click_worker`] applies the authoritative store
//!    increment and bumps the ephemeral cache counter
//! 4. Failures are logged and dropped, never retried

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
