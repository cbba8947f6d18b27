use super::app_error::AppError;
use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};

/// Unwraps a JSON body, turning malformed payloads into a 400.
pub fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(rejection) => Err(AppError::bad_request(anyhow::anyhow!(
            rejection.body_text()
        ))),
    }
}

/// Unwraps path ids. Ids that do not parse cannot exist, hence a 404.
pub fn path_ids<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    match path {
        Ok(Path(ids)) => Ok(ids),
        Err(_) => Err(AppError::NotFound),
    }
}
