//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// Log level
    pub log_level: String,

    /// Root directory holding box files as `owner/box/version/provider.box`
    pub storage_path: String,

    /// Externally visible base URL, used to build provider download URLs
    pub public_url: String,

    /// Maximum number of pooled database connections
    pub db_max_connections: u32,

    /// OTLP collector endpoint (optional)
    pub otel_endpoint: Option<String>,

    /// Service name reported to the OTLP collector
    pub otel_service_name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL not set".into()))?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "./boxes".into()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into())
                .trim_end_matches('/')
                .to_string(),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .unwrap_or(20),
            otel_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty()),
            otel_service_name: env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "alley".into()),
        })
    }

    /// Configuration for tests and local runs that never touch PostgreSQL.
    pub fn for_local(storage_path: impl Into<String>) -> Self {
        Self {
            database_url: String::new(),
            bind_address: "127.0.0.1:8080".into(),
            log_level: "debug".into(),
            storage_path: storage_path.into(),
            public_url: "http://localhost:8080".into(),
            db_max_connections: 1,
            otel_endpoint: None,
            otel_service_name: "alley".into(),
        }
    }
}
