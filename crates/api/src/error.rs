//! HTTP error mapping
//!
//! Core errors become typed HTTP failures with a JSON `{code, message}` body.
//! An already decided booking is an expected race (a double click on the
//! link), so it gets its own code and carries the current status.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use handyhub_core::{BookingStatus, Error as CoreError};
use serde::Serialize;

/// API result type
pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
                CoreError::InvalidToken => StatusCode::GONE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Io(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Validation(_) => "VALIDATION_ERROR",
                CoreError::NotFound(_) => "NOT_FOUND",
                CoreError::InvalidTransition { .. } => "ALREADY_DECIDED",
                CoreError::InvalidToken => "INVALID_TOKEN",
                _ => "STORAGE_ERROR",
            },
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Io(_) | ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Core(e) if e.is_retryable() => {
                "Storage is temporarily unavailable; retry later".to_string()
            }
            ApiError::Core(e) => e.to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Io(_) | ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Error response body (JSON)
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    /// Current booking status for `ALREADY_DECIDED`
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<BookingStatus>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, code = self.code(), error = %self, "Internal server error");
        }

        let current = match &self {
            ApiError::Core(CoreError::InvalidTransition { current, .. }) => Some(*current),
            _ => None,
        };
        let body = ErrorResponse {
            code: self.code(),
            message: self.client_message(),
            status: current,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_core_error_statuses() {
        let cases = [
            (CoreError::validation("empty"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (CoreError::not_found("booking", Uuid::nil()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                CoreError::InvalidTransition {
                    booking_id: Uuid::nil(),
                    current: BookingStatus::Accepted,
                },
                StatusCode::CONFLICT,
                "ALREADY_DECIDED",
            ),
            (CoreError::InvalidToken, StatusCode::GONE, "INVALID_TOKEN"),
            (
                CoreError::StorageUnavailable("locked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            let api = ApiError::from(error);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn test_storage_details_not_leaked() {
        let api = ApiError::from(CoreError::StorageUnavailable("/var/lib/secret.db".into()));
        assert!(!api.client_message().contains("secret"));
    }
}
