use super::app_error::{AppError, ErrorBody};
use super::auth::AuthenticatedUser;
use super::state::HttpServerState;
use super::utils::{json_payload, path_ids};
use crate::datamodel::{Metric, MetricChanges, MetricId, NewMetric};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;

/// List the caller's metrics.
#[utoipa::path(
    get,
    path = "/metrics/",
    tag = "Metrics",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Metrics owned by the caller", body = Vec<Metric>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    )
)]
pub async fn list_metrics(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<HttpServerState>,
) -> Result<Json<Vec<Metric>>, AppError> {
    Ok(Json(state.metrics.list_metrics(user_id).await?))
}

/// Create a metric.
#[utoipa::path(
    post,
    path = "/metrics/",
    tag = "Metrics",
    security(("bearer" = [])),
    request_body = NewMetric,
    responses(
        (status = 201, description = "Metric created", body = Metric),
        (status = 400, description = "Invalid or duplicate name", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    )
)]
pub async fn create_metric(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<HttpServerState>,
    payload: Result<Json<NewMetric>, JsonRejection>,
) -> Result<(StatusCode, Json<Metric>), AppError> {
    let payload = json_payload(payload)?;
    let metric = state.metrics.create_metric(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(metric)))
}

#[utoipa::path(
    get,
    path = "/metrics/{metric_id}/",
    tag = "Metrics",
    security(("bearer" = [])),
    params(("metric_id" = i64, Path, description = "Metric id")),
    responses(
        (status = 200, description = "The metric", body = Metric),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Missing or owned by someone else", body = ErrorBody),
    )
)]
pub async fn get_metric(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<HttpServerState>,
    path: Result<Path<MetricId>, PathRejection>,
) -> Result<Json<Metric>, AppError> {
    let metric_id = path_ids(path)?;
    Ok(Json(state.metrics.get_metric(user_id, metric_id).await?))
}

/// Update the name or description of a metric.
///
/// A new name is copied onto the metric's records after the update commits,
/// in the background when possible.
#[utoipa::path(
    patch,
    path = "/metrics/{metric_id}/",
    tag = "Metrics",
    security(("bearer" = [])),
    params(("metric_id" = i64, Path, description = "Metric id")),
    request_body = MetricChanges,
    responses(
        (status = 200, description = "Metric updated", body = Metric),
        (status = 400, description = "Invalid or duplicate name", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Missing or owned by someone else", body = ErrorBody),
    )
)]
pub async fn update_metric(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(state): State<HttpServerState>,
    path: Result<Path<MetricId>, PathRejection>,
    payload: Result<Json<MetricChanges>, JsonRejection>,
) -> Result<Json<Metric>, AppError> {
    let metric_id = path_ids(path)?;
    let changes = json_payload(payload)?;
    let metric = state
        .metrics
        .update_metric(user_id, metric_id, changes)
        .await?;
    Ok(Json(metric))
}
