// ==============================================================================
// lib.rs - Variant Result API Library
// ==============================================================================
// Description: HTTP CRUD service over a flat-file table of VCF-style variants
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

pub mod conditional;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod negotiate;
pub mod query;
pub mod state;
pub mod store;
pub mod validator;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use state::AppState;

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route(
            "/result",
            get(handlers::get_result)
                .post(handlers::create_result)
                .put(handlers::update_result)
                .delete(handlers::delete_result),
        )
        .layer(
            ServiceBuilder::new()
                // Request tracing
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
