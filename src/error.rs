use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors that surface to the caller. Everything else in the pipelines
/// degrades to a same-shape fallback instead of erroring.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request input.
    #[error("{0}")]
    BadRequest(String),
    /// The pet gate confidently decided the upload is not a pet photo.
    #[error("{message}")]
    NotPetImage { message: String, gate: Value },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::NotPetImage { message, gate } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "not_pet_image",
                    "message": message,
                    "gate": gate,
                })),
            )
                .into_response(),
        }
    }
}
