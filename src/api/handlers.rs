//! API request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisVerdict, LatestVerdict};
use crate::error::DetectorError;

use super::{error::ApiError, ApiState};

/// Body of `POST /analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Capture name relative to the captures directory
    pub filename: String,
    /// Keyword patterns replacing the defaults for this request
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// POST /analyze
pub async fn analyze_handler(
    State(state): State<ApiState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisVerdict>, ApiError> {
    let Json(req) = payload?;
    let detector = state.detector.clone();
    let verdict = run_blocking(&state, move || {
        detector.analyze_named(&req.filename, req.keywords.as_deref())
    })
    .await?;
    Ok(Json(verdict))
}

/// GET /latest
pub async fn latest_handler(State(state): State<ApiState>) -> Result<Json<LatestVerdict>, ApiError> {
    let detector = state.detector.clone();
    let verdict = run_blocking(&state, move || detector.analyze_latest()).await?;
    Ok(Json(verdict))
}

/// GET /healthz
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Run a pipeline call off the async workers, bounded by the request deadline
///
/// On timeout the blocking call is abandoned, not interrupted; the OCR
/// engine's own deadline still reclaims its process.
async fn run_blocking<T, F>(state: &ApiState, job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(state.request_timeout, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(result)) => result.map_err(ApiError::from),
        Ok(Err(join_error)) => Err(ApiError::internal(format!("Analysis task failed: {}", join_error))),
        Err(_) => Err(DetectorError::Timeout {
            seconds: state.request_timeout.as_secs(),
        }
        .into()),
    }
}
