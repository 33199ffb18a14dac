//! Client construction and the shared request helpers used by the resource
//! modules.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::Span;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::limiter::RateLimit;
use crate::retry::RetryPolicy;
use crate::transport::{ApiRequest, Transport};

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings consumed by [`ApiClient::new`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; resource paths are appended to it.
    pub base_url: Url,
    /// Value sent in the `X-API-KEY` header.
    pub api_key: String,
    /// Timeout for each individual attempt.
    pub timeout: Duration,
    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,
    /// Optional token bucket; `None` disables client-side limiting.
    pub rate_limit: Option<RateLimit>,
    /// Span every request is recorded under. Defaults to a disabled span.
    pub span: Span,
    /// Fixed `x-request-id`; a random UUID is used when unset.
    pub request_id: Option<String>,
}

impl ClientConfig {
    /// Defaults: 30s timeout, standard retry policy, no rate limiting.
    #[must_use]
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            rate_limit: None,
            span: Span::none(),
            request_id: None,
        }
    }

    /// Attach a token bucket limiter.
    #[must_use]
    pub const fn with_rate_limit(mut self, limit: RateLimit) -> Self {
        self.rate_limit = Some(limit);
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record requests under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Handle to the management API. Cheap to clone; clones share the HTTP
/// connection pool and the rate limiter.
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Arc<Transport>,
}

impl ApiClient {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the API key is empty, the base URL
    /// is not http(s), the timeout is zero or the rate limit is not positive.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = Transport::new(config)?;
        Ok(Self {
            transport: Arc::new(transport),
        })
    }

    /// API root the client was built with.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        request: &ApiRequest,
    ) -> ClientResult<T> {
        let body = self.transport.execute(cancel, request).await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode { source })
    }

    pub(crate) async fn send(
        &self,
        cancel: &CancellationToken,
        request: &ApiRequest,
    ) -> ClientResult<()> {
        self.transport.execute(cancel, request).await.map(drop)
    }
}
