//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When unset the service keeps its data in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_level: Level,
    /// Origin prefixed to shareable recipient links.
    pub public_origin: String,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let database_max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), e.to_string())
            })?,
            Err(_) => 5,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Web Settings ---
        let public_origin = std::env::var("PUBLIC_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        if !public_origin.starts_with("http://") && !public_origin.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PUBLIC_ORIGIN".to_string(),
                format!("'{}' must start with http:// or https://", public_origin),
            ));
        }

        let cors_allowed_origin = std::env::var("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            public_origin,
            cors_allowed_origin,
        })
    }

    /// Settings for running against the in-memory store, used by tests.
    pub fn local() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: None,
            database_max_connections: 5,
            log_level: Level::INFO,
            public_origin: "http://localhost:3000".to_string(),
            cors_allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}
