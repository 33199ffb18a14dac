//! Default values and environment variable names.

/// Base URL used when neither the config file nor the environment set one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1/ensync";
/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default sustained request rate (requests per second).
pub const DEFAULT_RATE_LIMIT_RPS: f64 = 10.0;
/// Default burst allowance of the request rate limiter.
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 20;
/// Name of the YAML document inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";
/// Directory name under the home directory when no override is set.
pub(crate) const CONFIG_DIR_NAME: &str = ".ensync";

/// Overrides the configuration directory.
pub const ENV_CONFIG_DIR: &str = "ENSYNC_CONFIG_DIR";
/// Supplies the API base URL.
pub const ENV_BASE_URL: &str = "ENSYNC_BASE_URL";
/// Supplies the API key.
pub const ENV_API_KEY: &str = "ENSYNC_API_KEY";
/// Enables debug logging when truthy.
pub const ENV_DEBUG: &str = "ENSYNC_DEBUG";
/// Selects the log output format.
pub const ENV_LOG_FORMAT: &str = "ENSYNC_LOG_FORMAT";
