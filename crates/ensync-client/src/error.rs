//! Error taxonomy for API calls.
//!
//! Display strings name only their own layer; causes are exposed through
//! `source()` so `{:#}` renders `failed to list events: API request failed ...`.

use std::fmt::{self, Display, Formatter};

use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the API on failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Normalised HTTP error response (status >= 400).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Message from the structured body, or the raw body when it was not JSON.
    pub message: String,
    /// Machine-readable code when the server provided one.
    pub code: Option<String>,
}

impl ApiError {
    /// Build an error from a failed response's status and body.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => Self {
                status,
                message: parsed
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| generic_message(status)),
                code: parsed.code.and_then(|code| match code {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(text) => Some(text),
                    other => Some(other.to_string()),
                }),
            },
            Err(_) => {
                let raw = String::from_utf8_lossy(body).trim().to_string();
                Self {
                    status,
                    message: if raw.is_empty() {
                        generic_message(status)
                    } else {
                        raw
                    },
                    code: None,
                }
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "API request failed with status {}: {}",
            self.status, self.message
        )?;
        if let Some(code) = &self.code {
            write!(formatter, " (code {code})")?;
        }
        Ok(())
    }
}

fn generic_message(status: u16) -> String {
    format!("request failed with status {status}")
}

/// Errors returned by [`crate::ApiClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client was constructed with unusable settings.
    #[error("invalid client configuration: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },
    /// Caller supplied arguments the request cannot be built from.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was wrong.
        message: String,
    },
    /// Connection, DNS, timeout or body read failure.
    #[error("request failed")]
    Transport {
        /// Underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },
    /// Server answered with status >= 400.
    #[error("{0}")]
    Api(ApiError),
    /// Response body did not match the expected shape.
    #[error("failed to decode response body")]
    Decode {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Request body could not be serialised.
    #[error("failed to encode request body")]
    Encode {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Waiting for a rate limiter token was aborted.
    #[error("rate limit wait aborted: {reason}")]
    RateLimit {
        /// Why the wait ended.
        reason: &'static str,
    },
    /// Cancellation was requested while a request or backoff was in flight.
    #[error("request cancelled")]
    Cancelled,
    /// Error annotated with the operation that produced it.
    #[error("failed to {operation}")]
    Operation {
        /// Operation label, e.g. `list events`.
        operation: &'static str,
        /// Underlying error.
        #[source]
        source: Box<ClientError>,
    },
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub(crate) fn context(self, operation: &'static str) -> Self {
        Self::Operation {
            operation,
            source: Box::new(self),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Innermost error, skipping operation annotations.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::Operation { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// API error at the root of the chain, if any.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self.root() {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of an API error at the root of the chain.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|err| err.status)
    }

    /// Operation label of the outermost annotation.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Operation { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn structured_body_fills_message_and_code() {
        let err = ApiError::from_response(401, br#"{"message":"Invalid API key","code":"AUTH"}"#);
        assert_eq!(err.status, 401);
        assert_eq!(err.message, "Invalid API key");
        assert_eq!(err.code.as_deref(), Some("AUTH"));
        assert_eq!(
            err.to_string(),
            "API request failed with status 401: Invalid API key (code AUTH)"
        );
    }

    #[test]
    fn numeric_code_is_rendered_as_text() {
        let err = ApiError::from_response(422, br#"{"message":"bad","code":42}"#);
        assert_eq!(err.code.as_deref(), Some("42"));
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        let err = ApiError::from_response(502, b"<html>Bad Gateway</html>\n");
        assert_eq!(err.message, "<html>Bad Gateway</html>");
        assert!(err.code.is_none());

        let empty = ApiError::from_response(500, b"");
        assert_eq!(empty.message, "request failed with status 500");
    }

    #[test]
    fn operation_context_keeps_root_inspectable() {
        let err = ClientError::Api(ApiError::from_response(404, br#"{"message":"missing"}"#))
            .context("get event");
        assert_eq!(err.to_string(), "failed to get event");
        assert_eq!(err.operation(), Some("get event"));
        assert_eq!(err.status(), Some(404));
        let source = err.source().expect("source");
        assert_eq!(
            source.to_string(),
            "API request failed with status 404: missing"
        );
        assert!(matches!(err.root(), ClientError::Api(_)));
    }

    #[test]
    fn non_api_errors_have_no_status() {
        let err = ClientError::RateLimit {
            reason: "cancelled while waiting for a token",
        }
        .context("list events");
        assert!(err.api_error().is_none());
        assert!(matches!(err.root(), ClientError::RateLimit { .. }));
    }
}
