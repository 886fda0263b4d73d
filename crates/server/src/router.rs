//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

/// `*` allows any origin; anything else must be a single valid origin.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS_ORIGIN; cross-origin requests disabled");
            CorsLayer::new()
        }
    }
}

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        .route("/api/summary", get(api::summary))
        // /export MUST precede any future /api/alerts/{id} route
        .route("/api/alerts/export", get(api::export_alerts))
        .route("/api/alerts", get(api::alerts))
        .route("/api/trends", get(api::trends))
        .route("/api/filters", get(api::filters))
        .route("/api/cache/invalidate", post(api::invalidate_cache))
        .layer(cors)
        .with_state(state)
}
