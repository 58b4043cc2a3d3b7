//! Route definitions for the API.

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::tracing::correlation_id_middleware;
use super::SharedState;
use crate::services::metrics_service;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // Operational endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/healthz", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/readyz", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        // Catalog: everything else is a catalog path
        .route("/", get(handlers::catalog::catalog_root))
        .route("/*path", get(handlers::catalog::catalog_path))
        .layer(middleware::from_fn(correlation_id_middleware))
        .with_state(state)
}

/// Router with the outer layers the server runs behind.
pub fn build_app(state: SharedState) -> Router {
    create_router(state)
        .layer(middleware::from_fn(metrics_service::metrics_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
