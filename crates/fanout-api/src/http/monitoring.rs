//! Health and status handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use fanout_core::CoordinatorSnapshot;

use crate::state::AppState;

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
}

/// Coordinator status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub uptime_seconds: u64,
    pub requests: u64,
    pub idle: bool,
    pub coordinator: CoordinatorSnapshot,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.coordinator.snapshot();
    Json(StatusResponse {
        uptime_seconds: state.uptime().as_secs(),
        requests: state.request_count(),
        idle: snapshot.is_idle(),
        coordinator: snapshot,
    })
}
