//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shelfwise_metadata::MetadataError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("invalid argument: {0}")]
    Core(#[from] shelfwise_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) | Self::Core(_) => "bad_request",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::PermissionDenied(_) => "permission_denied",
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => "not_found",
                MetadataError::BookNotFound(_) => "book_not_found",
                MetadataError::ShelfNotFound(_) => "shelf_not_found",
                MetadataError::DuplicateName(_) => "duplicate_name",
                MetadataError::AlreadyExists(_) => "conflict",
                MetadataError::DefaultShelfProtected(_) => "default_shelf_protected",
                MetadataError::Database(_)
                | MetadataError::Config(_)
                | MetadataError::Internal(_) => "internal_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Core(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_)
                | MetadataError::BookNotFound(_)
                | MetadataError::ShelfNotFound(_) => StatusCode::NOT_FOUND,
                MetadataError::DuplicateName(_) | MetadataError::AlreadyExists(_) => {
                    StatusCode::CONFLICT
                }
                MetadataError::DefaultShelfProtected(_) => StatusCode::FORBIDDEN,
                MetadataError::Database(_)
                | MetadataError::Config(_)
                | MetadataError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Whether details must be kept out of the response body.
    pub fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Details of internal failures are logged where they happen.
        let message = if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
