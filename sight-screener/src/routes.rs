//! HTTP routes for the screener service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::CandidateRow;
use crate::screener::{fresh_report, CacheStatus, FilterResult, ResultSource};
use crate::ScreenerState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<CandidateRow>,
    pub count: usize,
    pub source: ResultSource,
    pub timestamp: DateTime<Utc>,
    pub funnel: Vec<FilterResult>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub candidates: Vec<CandidateRow>,
    pub count: usize,
    pub listings_fetched: usize,
    pub cache_saved: bool,
    pub duration_secs: f64,
    pub funnel: Vec<FilterResult>,
}

#[derive(Debug, Serialize)]
pub struct CacheStatusResponse {
    #[serde(flatten)]
    pub cache: CacheStatus,
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Candidate query parameters
#[derive(Debug, Default, Deserialize)]
pub struct CandidatesQuery {
    #[serde(default)]
    pub refresh: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "sight-screener".to_string(),
    })
}

/// Screened candidates, from cache when valid
pub async fn get_candidates(
    State(state): State<Arc<ScreenerState>>,
    Query(query): Query<CandidatesQuery>,
) -> Json<CandidatesResponse> {
    let report = state.service.candidates(query.refresh).await;
    let count = report.rows.len();

    Json(CandidatesResponse {
        candidates: report.rows,
        count,
        source: report.source,
        timestamp: report.timestamp,
        funnel: report.funnel,
    })
}

/// Run the pipeline now
pub async fn refresh(State(state): State<Arc<ScreenerState>>) -> Json<RefreshResponse> {
    let run = state.service.refresh().await;
    let listings_fetched = run.listings_fetched;
    let cache_saved = run.cache_saved;
    let duration_secs = run.duration_secs();
    let report = fresh_report(run);

    Json(RefreshResponse {
        count: report.rows.len(),
        candidates: report.rows,
        listings_fetched,
        cache_saved,
        duration_secs,
        funnel: report.funnel,
    })
}

/// Cache file state
pub async fn cache_status(State(state): State<Arc<ScreenerState>>) -> Json<CacheStatusResponse> {
    Json(CacheStatusResponse {
        cache: state.service.cache_status(),
        running: state.service.is_running(),
    })
}

/// Delete the cache file
pub async fn clear_cache(
    State(state): State<Arc<ScreenerState>>,
) -> Result<Json<ClearCacheResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.service.clear_cache() {
        Ok(cleared) => Ok(Json(ClearCacheResponse { cleared })),
        Err(e) => {
            tracing::error!(error = %e, "Failed to clear screening cache");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: e.to_string() }),
            ))
        }
    }
}
