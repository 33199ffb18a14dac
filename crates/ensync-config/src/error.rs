//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key was supplied by any configuration layer.
    #[error("API key is required (pass --api-key, set ENSYNC_API_KEY or add api_key to the config file)")]
    MissingApiKey,
    /// Base URL could not be parsed.
    #[error("invalid base URL '{value}': {source}")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },
    /// Base URL parsed but cannot address the API.
    #[error("unsupported base URL '{value}': {reason}")]
    UnsupportedBaseUrl {
        /// Offending value.
        value: String,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// Field contained an invalid value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// Configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Configuration file was not valid YAML for the expected document.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
