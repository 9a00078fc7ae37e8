use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::{adapters::dto::image_dto::ErrorResponse, application::error::ApplicationError};

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = match self {
            ApplicationError::MethodNotAllowed(_) => {
                warn!("Method not allowed: {}", self);
                StatusCode::METHOD_NOT_ALLOWED
            }
            ApplicationError::ValidationFailure(ref msg) => {
                warn!("Upload rejected: {}", msg);
                StatusCode::BAD_REQUEST
            }
            ApplicationError::DirectoryUnavailable(ref msg) => {
                error!("Storage directory unavailable: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApplicationError::StorageFailure(ref msg) => {
                error!("Storage error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
