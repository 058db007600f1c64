//! Error types for jakas.

use std::time::Duration;

use thiserror::Error;

/// Default result type for jakas.
pub type JakasResult<T> = Result<T, JakasError>;

/// Errors that can occur in jakas.
#[derive(Error, Debug)]
pub enum JakasError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageUnavailable(String),

    #[error("Restaurant '{0}' not found")]
    RestaurantNotFound(String),

    #[error("Scorer '{0}' failed: {1}")]
    ScorerFailed(String, String),

    #[error("Scorer '{0}' timed out after {1:?}")]
    ScorerTimeout(String, Duration),

    #[error("Scorer '{0}' returned unusable output: {1}")]
    InvalidScorerOutput(String, String),

    #[cfg(feature = "cli")]
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

impl JakasError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the storage layer.
    pub fn is_storage(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Storage(_) => true,
            Self::StorageUnavailable(_) => true,
            _ => false,
        }
    }

    /// Whether this error came from the external scorer.
    pub fn is_scorer(&self) -> bool {
        matches!(
            self,
            Self::ScorerFailed(..) | Self::ScorerTimeout(..) | Self::InvalidScorerOutput(..)
        )
    }
}
