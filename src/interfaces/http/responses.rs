use crate::application::service::QueueDepths;
use crate::error::LedgerError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queues: QueueDepths,
}

/// Converts ledger errors into HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            LedgerError::AccountNotFound(_) | LedgerError::TransferNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LedgerError::InsufficientFunds { .. } | LedgerError::BalanceOverflow(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LedgerError::QueueFull(_) | LedgerError::QueueClosed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LedgerError::Config(_) | LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            format!("Bad request: {}", rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(LedgerError::MalformedInput("x".into())).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LedgerError::QueueFull("transaction")).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(LedgerError::AccountNotFound(4)).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(LedgerError::Storage("offline".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
