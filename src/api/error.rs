use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine::ledger::Error as LedgerError;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable identifier of the error kind.
    pub code: String,
    pub message: String,
}

/// Ledger failure on its way out to an HTTP client.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub LedgerError);

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            LedgerError::AlreadyExists(_) => (StatusCode::BAD_REQUEST, "already_exists"),
            LedgerError::InvalidIban(_) => (StatusCode::BAD_REQUEST, "invalid_iban"),
            LedgerError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
            LedgerError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            LedgerError::Overflow => (StatusCode::BAD_REQUEST, "overflow"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        tracing::debug! {
            %status, %self,
            "request failed"
        };

        let body = ErrorResponse {
            error: ErrorInfo {
                code: code.to_owned(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
