//! Error types for capweight

use thiserror::Error;

/// Main error type for capweight
#[derive(Error, Debug)]
pub enum CapweightError {
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Seed error: {0}")]
    SeedError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] rusqlite::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for capweight operations
pub type Result<T> = std::result::Result<T, CapweightError>;
