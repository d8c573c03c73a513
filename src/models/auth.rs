//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::UserRole;

/// Outstanding challenge for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Lowercase address the challenge was issued to
    pub address: String,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for an authentication nonce
#[derive(Debug, Deserialize, Validate)]
pub struct NonceRequest {
    #[validate(length(min = 1))]
    pub address: String,
}

/// Response containing the nonce to embed in the signed message
#[derive(Debug, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Request to exchange a signed message for an access token
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(min = 1))]
    pub address: String,
    /// Hex-encoded 65 byte signature (r || s || v)
    #[validate(length(min = 1))]
    pub signature: String,
    #[validate(length(min = 1))]
    pub message: String,
}

/// Access token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Profile returned by `GET /auth/profile`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub wallet_address: String,
    pub address: String,
    pub authenticated: bool,
}

/// Health response for `GET /auth/health`
#[derive(Debug, Serialize)]
pub struct AuthHealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
}
