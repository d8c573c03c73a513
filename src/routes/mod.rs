//! Route definitions for the wallet auth API

mod auth;
mod health;

pub use auth::auth_routes;
pub use health::health_routes;

use axum::Router;

use crate::middleware;
use crate::state::AppState;

/// Full application router with shared middleware
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
