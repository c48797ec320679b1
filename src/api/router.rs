//! Follow-up API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Follow-up routes are nested under `/api/followup/`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::followup::FollowUpEngine;

/// Build the follow-up API router around a shared engine.
pub fn followup_router(engine: Arc<FollowUpEngine>) -> Router {
    followup_router_with_ctx(ApiContext::new(engine))
}

/// Build the router from a pre-constructed context (custom dispatcher).
pub fn followup_router_with_ctx(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let followup = Router::new()
        .route("/recurring", get(endpoints::followup::recurring))
        .route("/inactive", get(endpoints::followup::inactive))
        .route(
            "/patients/:id/pattern",
            get(endpoints::followup::pattern),
        )
        .route(
            "/patients/:id/recommendations",
            get(endpoints::followup::recommendations),
        )
        .route(
            "/patients/:id/dispatch",
            post(endpoints::followup::dispatch),
        );

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .nest("/followup", followup)
        .with_state(ctx);

    Router::new().nest("/api", api)
}
