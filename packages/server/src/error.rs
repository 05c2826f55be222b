use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use serde::Serialize;

use crate::moderation::ModerationError;
use crate::store::StoreError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `USER_NOT_FOUND`, `ALREADY_FLAGGED`, `USERNAME_TAKEN`, `STORE_UNAVAILABLE`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "ALREADY_FLAGGED")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "You have already flagged this video")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    UserNotFound,
    AlreadyFlagged,
    UsernameTaken,
    /// A backing store is unreachable; safe to retry.
    StoreUnavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::UserNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "USER_NOT_FOUND",
                    message: "User not found".into(),
                },
            ),
            AppError::AlreadyFlagged => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ALREADY_FLAGGED",
                    message: "You have already flagged this video".into(),
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::StoreUnavailable(detail) => {
                tracing::error!("Store unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "STORE_UNAVAILABLE",
                        message: "Storage backend unavailable, try again later".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(detail) => AppError::StoreUnavailable(detail),
            StoreError::Conflict(detail) | StoreError::Corrupt(detail) => {
                AppError::Internal(detail)
            }
        }
    }
}

impl From<ModerationError> for AppError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::UserNotFound => AppError::UserNotFound,
            ModerationError::VideoNotFound => AppError::NotFound("Video not found".into()),
            ModerationError::AlreadyFlagged => AppError::AlreadyFlagged,
            ModerationError::NotAuthorized => AppError::PermissionDenied,
            ModerationError::StoreUnavailable(e) => e.into(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => {
                tracing::warn!(object_id = %id, "Video payload missing from object store");
                AppError::NotFound("Video content not found".into())
            }
            StorageError::InvalidId(msg) => AppError::Validation(msg),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("Video exceeds maximum size of {limit} bytes"))
            }
            StorageError::Io(e) => AppError::StoreUnavailable(format!("object store: {e}")),
        }
    }
}
