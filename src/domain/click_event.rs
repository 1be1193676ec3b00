//! Click event model for asynchronous click accounting.

/// An in-memory record of a completed redirect, queued for accounting.
///
/// Sent from the resolution engine to the background worker via a bounded
/// channel. This decouples the redirect response from the store write:
/// the increment never adds to redirect latency, and a full queue drops
/// the event rather than blocking.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub link_id: i64,
    pub short_code: String,
}

impl ClickEvent {
    pub fn new(link_id: i64, short_code: impl Into<String>) -> Self {
        Self {
            link_id,
            short_code: short_code.into(),
        }
    }
}
