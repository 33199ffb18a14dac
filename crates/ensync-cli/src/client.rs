//! CLI error type and API client construction.

use std::fmt::{self, Display, Formatter};

use ensync_client::{ApiClient, ClientConfig, ClientError, RateLimit};
use ensync_config::{ConfigError, Settings};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ClientError> for CliError {
    /// Bad input detected by the client counts as a validation error; the
    /// rest happened while talking to the server.
    fn from(err: ClientError) -> Self {
        let invalid_input = matches!(
            err.root(),
            ClientError::Config { .. } | ClientError::InvalidRequest { .. }
        );
        let error = anyhow::Error::new(err);
        if invalid_input {
            Self::Validation(format!("{error:#}"))
        } else {
            Self::Failure(error)
        }
    }
}

/// Build the API client described by resolved settings.
pub(crate) fn build_client(settings: &Settings) -> CliResult<ApiClient> {
    let config = ClientConfig::new(settings.base_url.clone(), settings.api_key.clone())
        .with_timeout(settings.timeout)
        .with_rate_limit(RateLimit::new(
            settings.rate_limit_rps,
            settings.rate_limit_burst,
        ))
        .with_span(tracing::debug_span!("api", base_url = %settings.base_url));
    Ok(ApiClient::new(config)?)
}
