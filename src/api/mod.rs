//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/timers",
            get(list_timers_handler)
                .post(create_timer_handler)
                .put(update_timer_handler)
                .delete(delete_timer_handler),
        )
        .route("/api/timers/start", post(start_timer_handler))
        .route("/api/timers/stop", post(stop_timer_handler))
        .route("/api/intents", post(intent_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
