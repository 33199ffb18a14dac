//! Configuration documents and the resolved settings they produce.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// YAML document read from `config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// API base URL.
    pub base_url: Option<String>,
    /// API key sent in the `X-API-KEY` header.
    pub api_key: Option<String>,
    /// Enables debug logging.
    pub debug: Option<bool>,
    /// HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Sustained request rate.
    pub rate_limit_rps: Option<f64>,
    /// Rate limiter burst allowance.
    pub rate_limit_burst: Option<u32>,
    /// Log output format (`pretty` or `json`).
    pub log_format: Option<String>,
}

/// Values supplied on the command line; they win over every other layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Explicit config file path. A missing explicit file is an error.
    pub config_path: Option<PathBuf>,
    /// API base URL.
    pub base_url: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Forces debug logging on when `true`.
    pub debug: bool,
    /// HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Sustained request rate.
    pub rate_limit_rps: Option<f64>,
    /// Rate limiter burst allowance.
    pub rate_limit_burst: Option<u32>,
    /// Log output format.
    pub log_format: Option<String>,
}

/// Fully resolved settings used to build the API client.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// API base URL; may carry a path prefix.
    pub base_url: Url,
    /// API key, guaranteed non-empty.
    pub api_key: String,
    /// Whether debug logging was requested.
    pub debug: bool,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Sustained request rate.
    pub rate_limit_rps: f64,
    /// Rate limiter burst allowance.
    pub rate_limit_burst: u32,
    /// Log output format, when configured.
    pub log_format: Option<String>,
    /// Config file that contributed to these settings, if any.
    pub source_file: Option<PathBuf>,
}
