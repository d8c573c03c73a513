//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/nonce", post(auth::request_nonce))
        .route("/auth/verify", post(auth::verify_signature))
        .route("/auth/profile", get(auth::get_profile))
        .route("/auth/health", get(auth::health))
}
