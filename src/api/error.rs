//! Mapping of service errors onto HTTP responses.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::error::ServiceError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl ServiceError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::StatusUpdateFailed { .. }
            | ServiceError::ReportInsertFailed { .. }
            | ServiceError::Persistence(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Config(_) | ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
