//! Application error types and result alias.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Catalog entity a failed lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Box,
    Version,
    Provider,
    Artifact,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Box => "box",
            Entity::Version => "version",
            Entity::Provider => "provider",
            Entity::Artifact => "artifact",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A path segment failed its format contract
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A well-formed query referenced something that does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    /// Internal contract broken; always a defect
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The entity store could not answer
    #[error("Entity store unavailable: {0}")]
    StoreUnavailable(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Conflict error (e.g., duplicate box name for an owner)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error on entity creation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Artifact storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Address parse error
    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: Entity, key: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Stable machine-readable code used in error bodies and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::InvalidPath(_) => "INVALID_PATH",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::Migration(_) => "MIGRATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::AddrParse(_) => "ADDR_PARSE_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for outcomes caused by the request rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidPath(_)
                | AppError::NotFound { .. }
                | AppError::Conflict(_)
                | AppError::Validation(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::InvalidPath(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound { entity, key } => (
                StatusCode::NOT_FOUND,
                format!("{} '{}' not found", entity, key),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Catalog store unavailable".to_string(),
            ),
            AppError::InvariantViolation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Catalog data is inconsistent".to_string(),
            ),
            AppError::Migration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database migration failed".to_string(),
            ),
            AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO operation failed".to_string(),
            ),
            AppError::AddrParse(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid address".to_string(),
            ),
            AppError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Serialization failed".to_string(),
            ),
            AppError::Config(msg) | AppError::Storage(msg) | AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        // Missing entities and malformed paths are routine; only server-side
        // failures are reported as faults.
        match &self {
            e if e.is_client_error() => tracing::debug!(error = %e, code, "Request rejected"),
            AppError::InvariantViolation(_) => {
                tracing::error!(error = %self, code, "Catalog invariant violated")
            }
            _ => tracing::error!(error = %self, code, "Request error"),
        }

        let body = Json(json!({
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}
