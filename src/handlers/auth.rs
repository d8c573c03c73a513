//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiResult;
use crate::models::{
    AuthHealthResponse, NonceRequest, NonceResponse, ProfileResponse, TokenResponse,
    VerifyRequest,
};
use crate::state::AppState;

/// POST /auth/nonce - Request a nonce for wallet authentication
pub async fn request_nonce(
    State(state): State<AppState>,
    Json(req): Json<NonceRequest>,
) -> ApiResult<Json<NonceResponse>> {
    req.validate()?;

    let nonce = state.auth_service.issue_challenge(&req.address)?;

    Ok(Json(nonce))
}

/// POST /auth/verify - Exchange a signed nonce for an access token
pub async fn verify_signature(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let token = state
        .auth_service
        .redeem_challenge(&req.address, &req.signature, &req.message)
        .await?;

    Ok(Json(token))
}

/// GET /auth/profile - Profile of the token holder
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<ProfileResponse> {
    Json(state.auth_service.profile(&user.claims).await)
}

/// GET /auth/health - Liveness of the auth endpoints
pub async fn health() -> Json<AuthHealthResponse> {
    Json(AuthHealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}
