use super::app_error::{AppError, ErrorBody};
use super::auth::AuthenticatedUser;
use super::state::HttpServerState;
use super::utils::json_payload;
use crate::datamodel::{NewTag, Tag};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

/// List all tags, ordered by name.
#[utoipa::path(
    get,
    path = "/tags/",
    tag = "Tags",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All tags", body = Vec<Tag>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    )
)]
pub async fn list_tags(
    _user: AuthenticatedUser,
    State(state): State<HttpServerState>,
) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(state.metrics.list_tags().await?))
}

#[utoipa::path(
    post,
    path = "/tags/",
    tag = "Tags",
    security(("bearer" = [])),
    request_body = NewTag,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Invalid or duplicate name", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    )
)]
pub async fn create_tag(
    _user: AuthenticatedUser,
    State(state): State<HttpServerState>,
    payload: Result<Json<NewTag>, JsonRejection>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let payload = json_payload(payload)?;
    let tag = state.metrics.create_tag(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}
