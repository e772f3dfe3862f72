//! Mimir error types

/// Mimir error types
#[derive(Debug, thiserror::Error)]
pub enum MimirError {
    // Construction errors
    #[error("invalid placeholder delimiter: {0:?}")]
    InvalidDelimiter(char),

    #[error("invalid context: {0}")]
    InvalidContext(String),

    #[error("invalid handler pattern: {0}")]
    InvalidPattern(String),

    /// Returned by handlers and custom resolvers. The registry and resolver
    /// convert this to an empty result; it never reaches resolver callers.
    #[error("handler error: {0}")]
    Handler(String),

    #[error("cache error: {0}")]
    Cache(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MimirError {
    /// Convenience constructor for handler failures.
    pub fn handler(message: impl Into<String>) -> Self {
        MimirError::Handler(message.into())
    }
}

/// Result type alias for Mimir operations
pub type Result<T> = std::result::Result<T, MimirError>;
