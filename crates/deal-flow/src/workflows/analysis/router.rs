use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ActorId, AnalysisStatus, ClientId, PropertyId, SaleOutcome};
use super::repository::{
    AnalysisRecord, AnalysisRepository, BlobStore, ExtractionOracle, ExtractionSource,
    RepositoryError,
};
use super::service::{AnalysisService, AnalysisServiceError, EditContext};
use crate::workflows::feasibility::lenient::deserialize_optional_date;
use crate::workflows::feasibility::PropertyAnalysisInput;

type SharedService<R, B, X> = Arc<AnalysisService<R, B, X>>;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) property_id: PropertyId,
    #[serde(default)]
    pub(crate) input: PropertyAnalysisInput,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) status: Option<AnalysisStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimRequest {
    pub(crate) actor: ActorId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveRequest {
    pub(crate) actor: ActorId,
    pub(crate) input: PropertyAnalysisInput,
    #[serde(default)]
    pub(crate) edit_mode: bool,
    #[serde(default)]
    pub(crate) revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteRequest {
    pub(crate) actor: ActorId,
    pub(crate) outcome: AnalysisStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DispatchRequest {
    pub(crate) client_id: ClientId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LostRequest {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PrefillRequest {
    pub(crate) actor: ActorId,
    pub(crate) source: ExtractionSource,
    #[serde(default)]
    pub(crate) edit_mode: bool,
    #[serde(default)]
    pub(crate) revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    pub(crate) target_roi: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

/// Router builder exposing the property analysis workflow.
pub fn analysis_router<R, B, X>(service: SharedService<R, B, X>) -> Router
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    Router::new()
        .route(
            "/api/v1/properties",
            post(register_handler::<R, B, X>).get(list_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id",
            get(status_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/claim",
            post(claim_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/analysis",
            axum::routing::put(save_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/complete",
            post(complete_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/dispatch",
            post(dispatch_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/sale",
            post(sale_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/lost",
            post(lost_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/prefill",
            post(prefill_handler::<R, B, X>),
        )
        .route(
            "/api/v1/properties/:property_id/report",
            get(report_handler::<R, B, X>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Json(request): Json<RegisterRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let result = service.register(request.property_id, request.input);
    record_response(&service, result, StatusCode::CREATED)
}

pub(crate) async fn list_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    match service.list(query.status) {
        Ok(records) => {
            let views: Vec<_> = records
                .iter()
                .map(|record| record.view(service.calculator()))
                .collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let result = service.get(&PropertyId(property_id));
    record_response(&service, result, StatusCode::OK)
}

pub(crate) async fn claim_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Json(request): Json<ClaimRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let result = service.claim(&PropertyId(property_id), &request.actor);
    record_response(&service, result, StatusCode::OK)
}

pub(crate) async fn save_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let context = EditContext {
        actor: request.actor,
        edit_mode: request.edit_mode,
        expected_revision: request.revision,
    };
    let result = service.save(&PropertyId(property_id), &context, request.input);
    record_response(&service, result, StatusCode::OK)
}

pub(crate) async fn complete_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Json(request): Json<CompleteRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let result = service.complete(&PropertyId(property_id), &request.actor, request.outcome);
    record_response(&service, result, StatusCode::OK)
}

pub(crate) async fn dispatch_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Json(request): Json<DispatchRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let result = service.dispatch(&PropertyId(property_id), request.client_id);
    record_response(&service, result, StatusCode::OK)
}

pub(crate) async fn sale_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Json(sale): Json<SaleOutcome>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let result = service.record_sale(&PropertyId(property_id), sale);
    record_response(&service, result, StatusCode::OK)
}

pub(crate) async fn lost_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Json(request): Json<LostRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    let result = service.mark_lost(&PropertyId(property_id), today);
    record_response(&service, result, StatusCode::OK)
}

pub(crate) async fn prefill_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Json(request): Json<PrefillRequest>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let context = EditContext {
        actor: request.actor,
        edit_mode: request.edit_mode,
        expected_revision: request.revision,
    };
    match service.prefill(&PropertyId(property_id), &context, &request.source) {
        Ok(outcome) => {
            let payload = json!({
                "applied_fields": outcome.applied_fields,
                "record": outcome.record.view(service.calculator()),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, B, X>(
    State(service): State<SharedService<R, B, X>>,
    Path(property_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    match service.report(&PropertyId(property_id), today, query.target_roi) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

fn record_response<R, B, X>(
    service: &AnalysisService<R, B, X>,
    result: Result<AnalysisRecord, AnalysisServiceError>,
    success: StatusCode,
) -> Response
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    match result {
        Ok(record) => (success, Json(record.view(service.calculator()))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: AnalysisServiceError) -> Response {
    let (status, payload) = match &error {
        AnalysisServiceError::AlreadyClaimed { assignee, .. } => (
            StatusCode::CONFLICT,
            json!({
                "error": "already_claimed",
                "assignee": assignee,
                "detail": error.to_string(),
            }),
        ),
        AnalysisServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "revision_conflict", "detail": error.to_string() }),
        ),
        AnalysisServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "not_found" }),
        ),
        AnalysisServiceError::ReadOnly { .. } | AnalysisServiceError::NotAssignee { .. } => (
            StatusCode::FORBIDDEN,
            json!({ "error": error.to_string() }),
        ),
        AnalysisServiceError::Lifecycle(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        AnalysisServiceError::Repository(RepositoryError::Unavailable(_))
        | AnalysisServiceError::Blob(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };

    (status, Json(payload)).into_response()
}
