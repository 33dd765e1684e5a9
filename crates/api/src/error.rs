//! Mapping of every failure onto the JSON error body.
//!
//! Responses look like `{"error": "NOT_FOUND", "message": "..."}`. Storage
//! details never reach the client; they are logged instead.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nestegg_core::ErrorKind;
use nestegg_core::budget::BudgetError;
use nestegg_core::period::PeriodError;
use nestegg_core::transaction::TransactionError;
use nestegg_db::StoreError;
use nestegg_shared::AppError;
use serde_json::json;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AppError`] that can be returned from a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 400 with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 403 with the given message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// 401 with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }
}

fn from_kind(kind: ErrorKind, message: String) -> AppError {
    match kind {
        ErrorKind::Validation => AppError::Validation(message),
        ErrorKind::StateConflict => AppError::Conflict(message),
        ErrorKind::NotFound => AppError::NotFound(message),
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        Self(from_kind(err.kind(), err.to_string()))
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        Self(from_kind(err.kind(), err.to_string()))
    }
}

impl From<PeriodError> for ApiError {
    fn from(err: PeriodError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Budget(e) => e.into(),
            StoreError::Transaction(e) => e.into(),
            StoreError::Conflict(detail) => Self(AppError::Conflict(format!(
                "{detail}; reload and try again"
            ))),
            StoreError::Transient(detail) => Self(AppError::Unavailable(detail)),
            err @ StoreError::Corrupt { .. } => Self(AppError::Internal(err.to_string())),
            StoreError::Database(e) => Self(AppError::Database(e.to_string())),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.0.error_code(), "Request rejected");
        }
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.public_message(),
            })),
        )
            .into_response()
    }
}
