use thiserror::Error;

/// Main error type for WikiBacon
#[derive(Error, Debug)]
pub enum WikibaconError {
    /// Link cache database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding of cached link lists or API payloads
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Encyclopedia API errors (transport, HTTP status, malformed payload)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Embedding API errors
    #[error("Embedding API error: {0}")]
    Embedding(String),
}

/// Convenient Result type using WikibaconError
pub type Result<T> = std::result::Result<T, WikibaconError>;
