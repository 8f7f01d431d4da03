//! API error handling.
//!
//! Structured error responses with stable machine-readable codes, proper
//! HTTP status codes and request tracking. Engine errors map 1:1 onto
//! codes so callers can tell "your request was invalid" (4xx, never worth
//! retrying unchanged) from "try again" (503 from the store).

use crate::errors::EngineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code (INVALID_STAKE, SESSION_NOT_PENDING, ...).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error carrying the request id it belongs to.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub request_id: String,
}

impl ApiError {
    /// Map an engine error onto its HTTP representation.
    pub fn from_engine(request_id: String, err: EngineError) -> Self {
        let (status, code) = match &err {
            EngineError::InvalidStake(_) => (StatusCode::BAD_REQUEST, "INVALID_STAKE"),
            EngineError::InsufficientFunds { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS")
            }
            EngineError::GameplayBanned { .. } => (StatusCode::FORBIDDEN, "GAMEPLAY_BANNED"),
            EngineError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            EngineError::SessionNotOwned => (StatusCode::FORBIDDEN, "SESSION_NOT_OWNED"),
            EngineError::SessionNotPending => (StatusCode::CONFLICT, "SESSION_NOT_PENDING"),
            EngineError::InvalidChoice(_) => (StatusCode::BAD_REQUEST, "INVALID_CHOICE"),
            EngineError::AlreadyRevealed(_) => (StatusCode::BAD_REQUEST, "ALREADY_REVEALED"),
            EngineError::PlayerNotFound(_) => (StatusCode::NOT_FOUND, "PLAYER_NOT_FOUND"),
            EngineError::PlayerExists(_) => (StatusCode::CONFLICT, "PLAYER_EXISTS"),
            EngineError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
        };
        Self {
            status,
            code,
            message: err.to_string(),
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message,
            request_id,
        }
    }

    pub fn unauthorized(request_id: String, message: String) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message,
            request_id,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.request_id, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: self.code.to_string(),
                message: self.message,
            },
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        let err = ApiError::from_engine(
            "req-1".to_string(),
            EngineError::SessionNotPending,
        );
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "SESSION_NOT_PENDING");

        let err = ApiError::from_engine(
            "req-2".to_string(),
            EngineError::StoreUnavailable("down".to_string()),
        );
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, "STORE_UNAVAILABLE");
    }
}
