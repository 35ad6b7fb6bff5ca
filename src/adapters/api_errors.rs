use crate::domain::error::RecordError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Newtype so the record service errors can be returned from axum handlers.
pub struct ApiError(pub RecordError);

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            RecordError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            RecordError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": self.0.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
