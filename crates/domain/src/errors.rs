//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Kimai
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum KimaiError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KimaiError {
    /// Build a `NotFound` error for an entity kind and id.
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} {id} not found"))
    }

    /// The user-facing message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Database(m)
            | Self::Config(m)
            | Self::Network(m)
            | Self::Auth(m)
            | Self::AccessDenied(m)
            | Self::NotFound(m)
            | Self::InvalidInput(m)
            | Self::Conflict(m)
            | Self::Io(m)
            | Self::Internal(m) => m,
        }
    }
}

impl From<std::io::Error> for KimaiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for Kimai operations
pub type Result<T> = std::result::Result<T, KimaiError>;
