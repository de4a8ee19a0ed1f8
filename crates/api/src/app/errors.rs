//! Domain error → HTTP response mapping.
//!
//! This is the only place error groups meet status codes. Storage constraint
//! and internal failures collapse to one generic body; their details stay in
//! the logs.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use jobboard_core::{DomainError, ErrorGroup, ErrorKind, StorageFailure};

/// Status and public `(code, message)` for a domain error.
pub fn status_for(err: &DomainError) -> (StatusCode, &'static str, &'static str) {
    let kind = err.kind();
    match kind.group() {
        ErrorGroup::Validation => (StatusCode::BAD_REQUEST, kind.code(), kind.message()),
        ErrorGroup::NotFound => (StatusCode::NOT_FOUND, kind.code(), kind.message()),
        ErrorGroup::Authentication => (StatusCode::UNAUTHORIZED, kind.code(), kind.message()),
        ErrorGroup::Authorization => (StatusCode::FORBIDDEN, kind.code(), kind.message()),
        ErrorGroup::OperationFailure => {
            (StatusCode::INTERNAL_SERVER_ERROR, kind.code(), kind.message())
        }
        ErrorGroup::StorageConstraint | ErrorGroup::Internal => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal.code(),
            ErrorKind::Internal.message(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Handler error type.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<ErrorKind> for ApiError {
    fn from(kind: ErrorKind) -> Self {
        Self(kind.into())
    }
}

impl From<StorageFailure> for ApiError {
    fn from(failure: StorageFailure) -> Self {
        Self(failure.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::with_context(
            ErrorKind::MalformedBody,
            rejection.body_text(),
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, code, message) = status_for(&err);
        let context = err.context().unwrap_or_default();

        match err.group() {
            ErrorGroup::Internal | ErrorGroup::OperationFailure => {
                tracing::error!(kind = ?err.kind(), context, "request failed");
            }
            ErrorGroup::StorageConstraint => {
                tracing::warn!(kind = ?err.kind(), context, "request hit a storage constraint");
            }
            _ => {
                tracing::debug!(kind = ?err.kind(), context, status = status.as_u16(), "request rejected");
            }
        }

        json_error(status, code, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
