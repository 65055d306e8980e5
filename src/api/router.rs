//! API router.
//!
//! Returns a composable `Router` with every dashboard endpoint nested
//! under `/api/`, wrapped in request tracing and a permissive CORS layer
//! for the browser dashboard.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

pub fn api_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::submit),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route("/rescore", post(endpoints::patients::rescore))
        .route("/metrics", get(endpoints::dashboard::metrics))
        .route("/hospitals", get(endpoints::dashboard::hospitals))
        .route("/alerts", get(endpoints::dashboard::alerts))
        .route("/analytics", get(endpoints::dashboard::analytics))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
