use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use deal_flow::error::AppError;
use deal_flow::workflows::analysis::{
    analysis_router, AnalysisRepository, AnalysisService, BlobStore, ExtractionOracle,
};
use deal_flow::workflows::feasibility::{
    suggest_bid, BidSuggestion, ComparablesImporter, FeasibilityReport, MetricsSnapshot,
    PropertyAnalysisInput,
};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct MetricsRequest {
    pub(crate) input: PropertyAnalysisInput,
    #[serde(default)]
    pub(crate) bid: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequest {
    pub(crate) input: PropertyAnalysisInput,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) target_roi: Option<f64>,
    /// Optional `link,value,area` CSV replacing the form's comparables.
    #[serde(default)]
    pub(crate) comparables_csv: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaxBidRequest {
    pub(crate) input: PropertyAnalysisInput,
    #[serde(default)]
    pub(crate) target_roi: Option<f64>,
}

pub(crate) fn with_feasibility_routes<R, B, X>(
    service: Arc<AnalysisService<R, B, X>>,
) -> axum::Router
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    analysis_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/feasibility/metrics", post(feasibility_metrics_endpoint))
        .route("/api/v1/feasibility/report", post(feasibility_report_endpoint))
        .route("/api/v1/feasibility/max-bid", post(max_bid_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn feasibility_metrics_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<MetricsRequest>,
) -> Json<MetricsSnapshot> {
    let bid = payload.bid.unwrap_or(payload.input.initial_bid);
    Json(state.calculator.compute(&payload.input, bid))
}

pub(crate) async fn feasibility_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<FeasibilityReport>, AppError> {
    let ReportRequest {
        mut input,
        today,
        target_roi,
        comparables_csv,
    } = payload;

    if let Some(csv) = comparables_csv {
        input.comparables = ComparablesImporter::from_reader(Cursor::new(csv.into_bytes()))?;
    }

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    Ok(Json(FeasibilityReport::build(
        &state.calculator,
        &input,
        today,
        target_roi,
    )))
}

pub(crate) async fn max_bid_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<MaxBidRequest>,
) -> Json<BidSuggestion> {
    let target_roi = payload
        .target_roi
        .filter(|target| target.is_finite())
        .unwrap_or(state.target_roi);
    Json(suggest_bid(&state.calculator, &payload.input, target_roi))
}
