//! Core error types for pantheon-core.
//!
//! `ApiError` covers everything that can go wrong talking to the remote
//! server; `ConfigError` covers the local TOML file. Both fold into
//! `CoreError` for callers that don't care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pantheon-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML rendering errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors returned by [`crate::api::ApiClient`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// The base URL or a derived endpoint could not be parsed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Connection, TLS, timeout or body-transfer failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered but the body was not what we expected.
    #[error("Decoding error for {endpoint}: {source}")]
    Decoding {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Non-success HTTP status.
    #[error("Server error: {status}")]
    Server { status: u16 },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ApiError {
    /// Whether retrying the same request might succeed.
    ///
    /// Display paths use this to decide between a "retry" prompt and a
    /// plain failure message.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Server { status } => *status >= 500,
            ApiError::InvalidUrl { .. } | ApiError::Decoding { .. } | ApiError::Unknown(_) => {
                false
            }
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home/config directory could not be determined or created
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
