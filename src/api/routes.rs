//! API route configuration.
//!
//! The public shorten endpoint accepts anonymous callers (ownership is
//! attached opportunistically); link management requires Bearer token
//! authentication via [`crate::api::middleware::auth`].

use crate::api::handlers::{
    analytics_handler, create_link_handler, delete_link_handler, list_links_handler,
    shorten_handler,
};
use crate::api::middleware::{auth, rate_limit};
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

/// All `/api` routes with their authentication and rate-limit layers.
///
/// # Endpoints
///
/// - `POST   /shorten`               - Create a short link (optional auth)
/// - `POST   /urls`                  - Create a link with expiry/password (auth)
/// - `GET    /urls`                  - List the caller's links (auth)
/// - `GET    /urls/{code}/analytics` - Click statistics for a link (auth)
/// - `DELETE /urls/{code}`           - Delete a link (auth)
///
/// Both creation endpoints share the tighter creation rate budget; the
/// limiter always runs before authentication.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/shorten", post(shorten_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth::optional))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::create,
        ));

    let creation = Router::new()
        .route("/urls", post(create_link_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::create,
        ));

    let management = Router::new()
        .route("/urls", get(list_links_handler))
        .route("/urls/{code}", delete(delete_link_handler))
        .route("/urls/{code}/analytics", get(analytics_handler));

    let protected = creation
        .merge(management)
        .layer(middleware::from_fn_with_state(state, auth::require));

    public.merge(protected)
}
