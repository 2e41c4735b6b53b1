//! API error type with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use payment::PaymentError;

/// API-level error that maps to an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// Resource absent or not owned by the caller.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid caller identity.
    Unauthorized(String),
    /// The request conflicts with current state.
    Conflict(String),
    /// An upstream collaborator (payment provider) failed.
    BadGateway(String),
    /// Internal server error; detail is logged, not exposed.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { .. } => ApiError::BadRequest(err.to_string()),
            DomainError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DomainError::EmptyCart => ApiError::BadRequest(err.to_string()),
            DomainError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::OrderNotFound => ApiError::NotFound(err.to_string()),
            PaymentError::AlreadyPaid => ApiError::Conflict(err.to_string()),
            PaymentError::InitiationFailed(_) => ApiError::BadGateway(err.to_string()),
            PaymentError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}
