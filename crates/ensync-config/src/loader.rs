//! Resolve [`Settings`] from defaults, the YAML file, the environment and
//! command-line overrides, in increasing order of precedence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::defaults::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT_BURST,
    DEFAULT_RATE_LIMIT_RPS, DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_BASE_URL, ENV_CONFIG_DIR,
    ENV_DEBUG, ENV_LOG_FORMAT,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigOverrides, FileConfig, Settings};

/// Load settings using the process environment.
///
/// # Errors
///
/// Returns [`ConfigError`] when the config file cannot be read or parsed, a
/// value is invalid, or no API key is configured.
pub fn load(overrides: &ConfigOverrides) -> ConfigResult<Settings> {
    load_with_env(overrides, |key| std::env::var(key).ok())
}

/// Load settings using an explicit environment lookup.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<F>(overrides: &ConfigOverrides, env: F) -> ConfigResult<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let (file, source_file) = match &overrides.config_path {
        Some(path) => (read_config_file(path)?, Some(path.clone())),
        None => {
            let path = default_config_dir(&env).join(CONFIG_FILE_NAME);
            match read_optional_config_file(&path)? {
                Some(file) => (file, Some(path)),
                None => (FileConfig::default(), None),
            }
        }
    };

    if let Some(path) = &source_file {
        tracing::debug!(path = %path.display(), "loaded configuration file");
    }

    let raw_base_url = first_non_empty([
        overrides.base_url.clone(),
        env(ENV_BASE_URL),
        file.base_url.clone(),
    ])
    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = parse_base_url(&raw_base_url)?;

    let api_key = first_non_empty([
        overrides.api_key.clone(),
        env(ENV_API_KEY),
        file.api_key.clone(),
    ])
    .ok_or(ConfigError::MissingApiKey)?;

    let env_debug = env(ENV_DEBUG).map(|raw| parse_bool(&raw)).transpose()?;
    let debug = overrides.debug || env_debug.or(file.debug).unwrap_or(false);

    let timeout_secs = overrides
        .timeout_secs
        .or(file.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidField {
            field: "timeout_secs",
            value: timeout_secs.to_string(),
            reason: "must be greater than zero",
        });
    }

    let rate_limit_rps = overrides
        .rate_limit_rps
        .or(file.rate_limit_rps)
        .unwrap_or(DEFAULT_RATE_LIMIT_RPS);
    if !rate_limit_rps.is_finite() || rate_limit_rps <= 0.0 {
        return Err(ConfigError::InvalidField {
            field: "rate_limit_rps",
            value: rate_limit_rps.to_string(),
            reason: "must be a positive number",
        });
    }

    let rate_limit_burst = overrides
        .rate_limit_burst
        .or(file.rate_limit_burst)
        .unwrap_or(DEFAULT_RATE_LIMIT_BURST);
    if rate_limit_burst == 0 {
        return Err(ConfigError::InvalidField {
            field: "rate_limit_burst",
            value: rate_limit_burst.to_string(),
            reason: "must be at least 1",
        });
    }

    let log_format = first_non_empty([
        overrides.log_format.clone(),
        env(ENV_LOG_FORMAT),
        file.log_format,
    ]);

    Ok(Settings {
        base_url,
        api_key,
        debug,
        timeout: Duration::from_secs(timeout_secs),
        rate_limit_rps,
        rate_limit_burst,
        log_format,
        source_file,
    })
}

/// Directory searched for `config.yaml`: `$ENSYNC_CONFIG_DIR`, then
/// `~/.ensync`, then the working directory.
#[must_use]
pub fn default_config_dir<F>(env: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = env(ENV_CONFIG_DIR).filter(|dir| !dir.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir().map_or_else(|| PathBuf::from("."), |home| home.join(CONFIG_DIR_NAME))
}

fn read_config_file(path: &Path) -> ConfigResult<FileConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_document(path, &raw)
}

fn read_optional_config_file(path: &Path) -> ConfigResult<Option<FileConfig>> {
    match fs::read_to_string(path) {
        Ok(raw) => parse_config_document(path, &raw).map(Some),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_config_document(path: &Path, raw: &str) -> ConfigResult<FileConfig> {
    // An empty document deserialises to unit, not a mapping.
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        value: trimmed.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedBaseUrl {
            value: trimmed.to_string(),
            reason: "scheme must be http or https",
        });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::UnsupportedBaseUrl {
            value: trimmed.to_string(),
            reason: "query strings and fragments are not allowed",
        });
    }
    Ok(url)
}

fn parse_bool(raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidField {
            field: "debug",
            value: raw.to_string(),
            reason: "must be a boolean",
        }),
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
