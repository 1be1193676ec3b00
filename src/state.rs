//! Shared application state injected into handlers.
//!
//! Constructed once at process start with an explicit lifecycle (connect,
//! health-check, serve) and passed by reference to the components that need
//! it; no ambient global clients.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::middleware::rate_limit::RateLimits;
use crate::application::services::{AuthService, LinkService, ResolveService};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{LinkRepository, TokenRepository};
use crate::infrastructure::cache::CacheService;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub resolve_service: Arc<ResolveService<dyn LinkRepository>>,
    pub auth_service: Arc<AuthService<dyn TokenRepository>>,
    pub cache: Arc<dyn CacheService>,
    pub click_tx: mpsc::Sender<ClickEvent>,
    pub base_url: String,
    pub limits: RateLimits,
}
