use super::app_error::{AppError, ErrorBody};
use super::auth::AuthenticatedUser;
use super::state::HttpServerState;
use super::utils::{json_payload, path_ids};
use crate::datamodel::{MetricId, MetricRecord, NewRecord, RecordId};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;

/// List the records of a metric, newest first.
///
/// Served from cache when possible. Metrics the caller does not own list as empty.
#[utoipa::path(
    get,
    path = "/metrics/{metric_id}/records/",
    tag = "Records",
    security(("bearer" = [])),
    params(("metric_id" = i64, Path, description = "Metric id")),
    responses(
        (status = 200, description = "Records of the metric", body = Vec<MetricRecord>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    )
)]
pub async fn list_records(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<HttpServerState>,
    path: Result<Path<MetricId>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let metric_id = path_ids(path)?;
    Ok(Json(state.listing.list(user_id, metric_id).await?))
}

/// Add a record to a metric.
#[utoipa::path(
    post,
    path = "/metrics/{metric_id}/records/",
    tag = "Records",
    security(("bearer" = [])),
    params(("metric_id" = i64, Path, description = "Metric id")),
    request_body = NewRecord,
    responses(
        (status = 201, description = "Record created", body = MetricRecord),
        (status = 400, description = "Invalid timestamp, value or tags, or duplicate timestamp", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Missing or owned by someone else", body = ErrorBody),
    )
)]
pub async fn create_record(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<HttpServerState>,
    path: Result<Path<MetricId>, PathRejection>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<MetricRecord>), AppError> {
    let metric_id = path_ids(path)?;
    let payload = json_payload(payload)?;
    let record = state.ingestion.submit(user_id, metric_id, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/metrics/{metric_id}/records/{record_id}/",
    tag = "Records",
    security(("bearer" = [])),
    params(
        ("metric_id" = i64, Path, description = "Metric id"),
        ("record_id" = i64, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "The record", body = MetricRecord),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Missing or owned by someone else", body = ErrorBody),
    )
)]
pub async fn get_record(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<HttpServerState>,
    path: Result<Path<(MetricId, RecordId)>, PathRejection>,
) -> Result<Json<MetricRecord>, AppError> {
    let (metric_id, record_id) = path_ids(path)?;
    let record = state
        .listing
        .get_record(user_id, metric_id, record_id)
        .await?;
    Ok(Json(record))
}
