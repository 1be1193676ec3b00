//! Background worker applying click accounting.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Consumes click events and applies the authoritative store increment.
///
/// Each event triggers a single atomic `click_count + 1` against the store
/// and a best-effort bump of the ephemeral cache counter. Failures are
/// logged and the event is dropped; there is no retry queue. The loop ends
/// when all senders are dropped.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    repo: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
) {
    while let Some(ev) = rx.recv().await {
        match repo.increment_clicks(ev.link_id).await {
            Ok(count) => {
                debug!("Click recorded for {} (total: {})", ev.short_code, count);
            }
            Err(e) => {
                warn!("Dropped click for {}: {}", ev.short_code, e);
                continue;
            }
        }

        // Analytics hint only; the store count above is authoritative.
        let _ = cache.increment_click_counter(&ev.short_code).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::NullCache;
    use serde_json::json;

    #[tokio::test]
    async fn test_worker_increments_store_per_event() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_increment_clicks()
            .withf(|id| *id == 5)
            .times(3)
            .returning(|_| Ok(1));

        let (tx, rx) = mpsc::channel(16);
        let worker = tokio::spawn(run_click_worker(
            rx,
            Arc::new(mock_repo),
            Arc::new(NullCache::new()),
        ));

        for _ in 0..3 {
            tx.send(ClickEvent::new(5, "clickme")).await.unwrap();
        }
        drop(tx);

        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_survives_store_errors() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_increment_clicks()
            .times(2)
            .returning(|_| Err(crate::error::AppError::internal("Database error", json!({}))));

        let (tx, rx) = mpsc::channel(16);
        let worker = tokio::spawn(run_click_worker(
            rx,
            Arc::new(mock_repo),
            Arc::new(NullCache::new()),
        ));

        tx.send(ClickEvent::new(1, "a")).await.unwrap();
        tx.send(ClickEvent::new(2, "b")).await.unwrap();
        drop(tx);

        // Worker drains both events and exits cleanly despite failures.
        worker.await.unwrap();
    }
}
