use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::{commands, domain::notification::ValidationError};

use super::ApiResponse;

/// Errors returned by the HTTP handlers
///
/// Every variant renders as `{ "success": false, "message": ... }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// The email transport declined or failed to deliver
    DeliveryFailed,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::DeliveryFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send email".to_string(),
            ),
            ApiError::Internal(msg) => {
                error!("internal server error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid request body".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("rejected query string: {}", rejection.body_text());
        ApiError::BadRequest("Invalid query string".to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<commands::Error> for ApiError {
    fn from(err: commands::Error) -> Self {
        match err {
            commands::Error::NotFound(_) => ApiError::NotFound("Pass not found".to_string()),
            commands::Error::DuplicateOwner(_) => {
                ApiError::Conflict("An active pass already exists for this owner".to_string())
            }
            commands::Error::ConcurrencyConflict { .. } => {
                ApiError::Conflict("Pass was modified concurrently, please retry".to_string())
            }
            commands::Error::InvalidPass(err) => ApiError::BadRequest(err.to_string()),
            commands::Error::InvalidRequest(msg) => ApiError::BadRequest(msg.into_owned()),
            err @ (commands::Error::Database(_) | commands::Error::Timeout(_)) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}
