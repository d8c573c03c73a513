//! Service health routes

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

async fn root() -> &'static str {
    "Wallet Auth API Server"
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_status = match &state.db_pool {
        Some(pool) => match db::check_health(pool).await {
            Ok(()) => "connected".to_string(),
            Err(e) => format!("error: {}", e),
        },
        None => "not configured".to_string(),
    };

    let status = if db_status.starts_with("error") {
        "unhealthy"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
