//! Query API handlers.
//!
//! Every handler answers with a JSON body. Query failures are ordinary
//! outcomes (`success: false`) rather than HTTP errors; only malformed
//! requests and unknown platforms get a 4xx status.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fanout_protocols::{
    ConnectionStatus, PlatformId, QueryError, QueryOutcome, ScrapeReport, TabInfo,
};

use crate::state::AppState;

/// Request to query one platform.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub platform: String,
    pub prompt: String,
}

/// Request to fan a prompt out to several platforms.
#[derive(Debug, Deserialize)]
pub struct BatchQueryRequest {
    pub prompt: String,
    /// Platforms to query. Defaults to the enabled set.
    #[serde(default)]
    pub platforms: Option<Vec<String>>,
}

/// Per-platform outcomes of a fan-out.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchQueryResponse {
    pub results: BTreeMap<String, QueryOutcome>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TabsResponse {
    pub count: usize,
    pub tabs: Vec<TabInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub id: String,
    pub name: String,
    pub url_pattern: String,
    pub script: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlatformsResponse {
    pub platforms: Vec<PlatformInfo>,
    pub enabled: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn outcome_status(result: &Result<String, QueryError>) -> StatusCode {
    match result {
        Err(QueryError::UnknownPlatform(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    }
}

/// Query one platform and wait for its terminal event.
///
/// POST /query
pub async fn submit_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    if req.prompt.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(QueryOutcome {
                success: false,
                response: None,
                error: Some("Prompt must not be empty".to_string()),
                code: Some("invalid_request".to_string()),
            }),
        );
    }

    info!("Query request: platform={}", req.platform);
    state.increment_requests(1);

    let result = state.coordinator.submit_query(&req.platform, &req.prompt).await;
    (outcome_status(&result), Json(QueryOutcome::from(result)))
}

/// Fan a prompt out to several platforms concurrently.
///
/// POST /query/batch
pub async fn submit_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchQueryRequest>,
) -> impl IntoResponse {
    if req.prompt.trim().is_empty() {
        return bad_request("Prompt must not be empty").into_response();
    }

    let requested = req
        .platforms
        .filter(|platforms| !platforms.is_empty())
        .unwrap_or_else(|| state.coordinator.registry().enabled());

    // Querying a platform twice would supersede the first query.
    let mut platforms: Vec<PlatformId> = Vec::with_capacity(requested.len());
    for platform in requested {
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }

    if platforms.is_empty() {
        return bad_request("No platforms to query").into_response();
    }

    info!("Batch query request: platforms={:?}", platforms);
    state.increment_requests(platforms.len() as u64);

    let results = state
        .coordinator
        .fan_out(&req.prompt, &platforms)
        .await
        .into_iter()
        .map(|(platform, result)| (platform, QueryOutcome::from(result)))
        .collect();

    Json(BatchQueryResponse { results }).into_response()
}

/// GET /connection/{platform}
pub async fn check_connection(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
) -> Json<ConnectionStatus> {
    Json(state.coordinator.check_connection(&platform).await)
}

/// GET /tabs
pub async fn list_tabs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.coordinator.list_tabs().await {
        Ok(tabs) => Json(TabsResponse {
            count: tabs.len(),
            tabs,
        })
        .into_response(),
        Err(e) => {
            warn!("Listing tabs failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /platforms
pub async fn list_platforms(State(state): State<Arc<AppState>>) -> Json<PlatformsResponse> {
    let registry = state.coordinator.registry();
    let enabled = registry.enabled();
    let platforms = registry
        .targets()
        .iter()
        .map(|target| PlatformInfo {
            id: target.id.clone(),
            name: target.name.clone(),
            url_pattern: target.pattern.to_string(),
            script: target.script.clone(),
            enabled: enabled.contains(&target.id),
        })
        .collect();

    Json(PlatformsResponse { platforms, enabled })
}

/// Scraper report delivered over HTTP instead of the CDP binding.
///
/// POST /scraper/report
pub async fn scraper_report(State(state): State<Arc<AppState>>, body: String) -> impl IntoResponse {
    match ScrapeReport::from_payload(&body) {
        Ok(report) => {
            debug!("HTTP scraper report for {}", report.platform());
            state.coordinator.handle_report(report);
            StatusCode::ACCEPTED.into_response()
        }
        Err(e) => bad_request(format!("Invalid scraper report: {}", e)).into_response(),
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
