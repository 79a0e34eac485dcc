//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::monitoring;
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Create the router.
///
/// ```text
/// POST /query                  - Query one platform, wait for its result
/// POST /query/batch            - Fan a prompt out to several platforms
/// GET  /connection/{platform}  - Is the platform's tab open?
/// GET  /tabs                   - List browser tabs
/// GET  /platforms              - Registered and enabled platforms
/// POST /scraper/report         - Scraper progress/final/error report
/// GET  /status                 - Coordinator snapshot
/// GET  /health                 - Health check
/// GET  /ws                     - WebSocket: live events and requests
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/query", post(handlers::submit_query))
        .route("/query/batch", post(handlers::submit_batch))
        .route("/connection/{platform}", get(handlers::check_connection))
        .route("/tabs", get(handlers::list_tabs))
        .route("/platforms", get(handlers::list_platforms))
        .route("/scraper/report", post(handlers::scraper_report))
        .route("/status", get(monitoring::status))
        .route("/health", get(monitoring::health_check))
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
