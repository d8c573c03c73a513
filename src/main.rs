//! Wallet Auth Server
//!
//! Issues one-time challenges to wallet addresses and exchanges signed
//! challenges for short-lived access tokens.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use wallet_auth_server::auth::{
    AuthService, HttpProfileProvider, IdentityResolver, InMemoryNonceStore, ProfileProvider,
    TokenIssuer,
};
use wallet_auth_server::config::Config;
use wallet_auth_server::db::{self, PgIdentityStore};
use wallet_auth_server::routes;
use wallet_auth_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting wallet auth server");

    let db_pool = db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;

    let identity_store = Arc::new(PgIdentityStore::new(db_pool.clone()));

    let profile_timeout = Duration::from_millis(config.profile_service_timeout_ms);
    let profile_provider: Option<Arc<dyn ProfileProvider>> = match &config.profile_service_url {
        Some(url) => {
            tracing::info!(url = %url, "Remote profile lookup enabled");
            let provider = HttpProfileProvider::new(url.clone(), profile_timeout)
                .context("Failed to build profile service client")?;
            Some(Arc::new(provider) as Arc<dyn ProfileProvider>)
        }
        None => {
            tracing::info!("PROFILE_SERVICE_URL not set, using local identity store only");
            None
        }
    };

    let auth_service = Arc::new(AuthService::new(
        Arc::new(InMemoryNonceStore::new(config.auth_nonce_ttl_seconds)),
        IdentityResolver::standard(identity_store, profile_provider, profile_timeout),
        TokenIssuer::new(&config.jwt_secret, config.jwt_expires_in_seconds),
    ));

    // Sweep expired challenges even when nobody is requesting new ones
    let sweep_interval = Duration::from_secs(config.auth_nonce_ttl_seconds as u64);
    let sweep_service = auth_service.clone();
    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = sweep_service.sweep_expired();
            if removed > 0 {
                tracing::debug!(removed, "Swept expired challenges");
            }
        }
    });

    let app = routes::app_router(AppState::new(auth_service, Some(db_pool)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
