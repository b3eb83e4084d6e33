//! Error types for offcache

use thiserror::Error;

/// Result type alias for offcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

/// Cache storage errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Only GET requests can be cached (got {0})")]
    UnsupportedMethod(String),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

/// Transport-level failures. An HTTP error status is not a network error.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Request timed out")]
    Timeout,

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Connect(err.to_string())
        } else if err.is_builder() {
            NetworkError::InvalidUrl(err.to_string())
        } else {
            NetworkError::Other(err.to_string())
        }
    }
}

/// Lifecycle and strategy failures of the offline cache controller
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Failed to cache {url}: {reason}")]
    PopulationFailed { url: String, reason: String },

    #[error("Network request failed ({cause}) and offline fallback {path} is not cached")]
    NoFallback { path: String, cause: String },

    #[error("Cannot {operation} while controller is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("No installed version is waiting to activate. Run `offcache install` first.")]
    NothingToActivate,
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Configuration already exists at {0}. Use --force to overwrite.")]
    AlreadyExists(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
