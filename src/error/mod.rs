//! Centralized API error handling
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{AuthError, ErrorCategory};

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Challenge required: {0}")]
    ChallengeRequired(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::ChallengeRequired(_) => "CHALLENGE_REQUIRED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ChallengeRequired(_) => StatusCode::UNAUTHORIZED,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Only the category of an auth failure reaches the client. Details were
// logged where the failure happened.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err.category() {
            ErrorCategory::Validation => ApiError::ValidationError(err.to_string()),
            ErrorCategory::ChallengeLifecycle => ApiError::ChallengeRequired(
                "Challenge missing or expired, request a new nonce".to_string(),
            ),
            ErrorCategory::Authentication => {
                ApiError::Unauthorized("Authentication failed".to_string())
            }
            ErrorCategory::Internal => {
                tracing::error!(error = %err, "Authentication aborted");
                ApiError::InternalError("Authentication could not be completed".to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            ApiError::Unauthorized("test".to_string()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            ApiError::ChallengeRequired("test".to_string()).error_code(),
            "CHALLENGE_REQUIRED"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::ValidationError("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ChallengeRequired("test".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InternalError("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_failures_hide_the_failing_check() {
        let failures = [
            AuthError::SignatureInvalid("bad recovery id".to_string()),
            AuthError::Unauthorized("signer mismatch".to_string()),
            AuthError::NotFound,
            AuthError::MalformedChallengeUsage,
        ];

        for failure in failures {
            let api = ApiError::from(failure);
            assert_eq!(api.error_code(), "UNAUTHORIZED");
            assert_eq!(api.to_string(), "Unauthorized: Authentication failed");
        }
    }

    #[test]
    fn test_lifecycle_and_validation_mapping() {
        assert_eq!(
            ApiError::from(AuthError::ChallengeExpired).error_code(),
            "CHALLENGE_REQUIRED"
        );
        assert_eq!(
            ApiError::from(AuthError::NoChallenge).error_code(),
            "CHALLENGE_REQUIRED"
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidAddress("x".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::Token("bad key".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
