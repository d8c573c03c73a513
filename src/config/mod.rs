//! Configuration management for the wallet auth service
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::auth::MAX_TTL_SECONDS;

/// Secret used when `JWT_SECRET` is unset. Refused in production.
const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL (shared users database)
    pub database_url: String,

    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// How long a query may wait for a pooled connection
    pub db_acquire_timeout_ms: u64,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// JWT secret for token signing
    pub jwt_secret: String,

    /// Access token TTL in seconds (default: 3600 = 1 hour)
    pub jwt_expires_in_seconds: i64,

    /// Auth nonce TTL in seconds (default: 300 = 5 minutes)
    pub auth_nonce_ttl_seconds: i64,

    /// Base URL of the users service; remote profile lookup is off when unset
    pub profile_service_url: Option<String>,

    /// Timeout for a single profile request
    pub profile_service_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5);
        let db_acquire_timeout_ms = parse_or("DB_ACQUIRE_TIMEOUT_MS", 3000);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        // JWT and Auth configuration
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            _ => DEV_JWT_SECRET.to_string(),
        };

        let jwt_expires_in_seconds =
            check_lifetime("JWT_EXPIRES_IN_SECONDS", parse_or("JWT_EXPIRES_IN_SECONDS", 3600))?;
        let auth_nonce_ttl_seconds =
            check_lifetime("AUTH_NONCE_TTL_SECONDS", parse_or("AUTH_NONCE_TTL_SECONDS", 300))?;

        let profile_service_url = env::var("PROFILE_SERVICE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let profile_service_timeout_ms = parse_or("PROFILE_SERVICE_TIMEOUT_MS", 2000);

        Ok(Config {
            database_url,
            environment,
            port,
            db_max_connections,
            db_acquire_timeout_ms,
            log_level,
            jwt_secret,
            jwt_expires_in_seconds,
            auth_nonce_ttl_seconds,
            profile_service_url,
            profile_service_timeout_ms,
        })
    }

    /// Get database URL (useful for logging masked version)
    pub fn database_url_masked(&self) -> String {
        // Mask password in database URL for logging
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                let prefix = &self.database_url[..colon_pos + 1];
                let suffix = &self.database_url[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
        self.database_url.clone()
    }
}

/// Parse an optional numeric variable, falling back on absence or garbage
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

/// Lifetimes must be positive and at most [`MAX_TTL_SECONDS`]
fn check_lifetime(name: &str, seconds: i64) -> Result<i64, ConfigError> {
    if seconds <= 0 || seconds > MAX_TTL_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {} seconds, got {}",
            name, MAX_TTL_SECONDS, seconds
        )));
    }
    Ok(seconds)
}
