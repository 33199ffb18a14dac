//! Request execution: auth headers, rate limiting, retries and error
//! normalisation applied uniformly to every call.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;
use uuid::Uuid;

use crate::client::ClientConfig;
use crate::error::{ApiError, ClientError, ClientResult};
use crate::limiter::RateLimiter;
use crate::retry::{RetryPolicy, duration_ms, retry_after};

pub(crate) const HEADER_API_KEY: &str = "x-api-key";
pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
const APPLICATION_JSON: &str = "application/json";

/// Method, server-relative path segments, query and optional JSON body.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub(crate) fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|segment| (*segment).to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub(crate) fn post(segments: &[&str]) -> Self {
        Self::new(Method::POST, segments)
    }

    pub(crate) fn put(segments: &[&str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub(crate) fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub(crate) fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
        let encoded =
            serde_json::to_vec(body).map_err(|source| ClientError::Encode { source })?;
        self.body = Some(encoded);
        Ok(self)
    }
}

struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct Transport {
    http: Client,
    base_url: Url,
    limiter: Option<RateLimiter>,
    retry: RetryPolicy,
    span: Span,
}

impl Transport {
    pub(crate) fn new(config: ClientConfig) -> ClientResult<Self> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(ClientError::config("API key is required"));
        }
        if config.base_url.cannot_be_a_base()
            || !matches!(config.base_url.scheme(), "http" | "https")
        {
            return Err(ClientError::config(format!(
                "base URL '{}' must be an http(s) URL",
                config.base_url
            )));
        }
        if config.timeout.is_zero() {
            return Err(ClientError::config("timeout must be greater than zero"));
        }
        if let Some(limit) = &config.rate_limit {
            limit.validate()?;
        }

        let mut key_value = HeaderValue::from_str(api_key)
            .map_err(|_| ClientError::config("API key contains characters not allowed in headers"))?;
        key_value.set_sensitive(true);
        let request_id = config
            .request_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let request_id = HeaderValue::from_str(&request_id)
            .map_err(|_| ClientError::config("request identifier contains invalid characters"))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(HEADER_API_KEY, key_value);
        default_headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| ClientError::config(format!("failed to build HTTP client: {err}")))?;

        let mut base_url = config.base_url;
        base_url.set_query(None);
        base_url.set_fragment(None);

        Ok(Self {
            http,
            base_url,
            limiter: config.rate_limit.map(RateLimiter::new),
            retry: config.retry,
            span: config.span,
        })
    }

    pub(crate) const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Run `request` and return the body of a successful response.
    pub(crate) async fn execute(
        &self,
        cancel: &CancellationToken,
        request: &ApiRequest,
    ) -> ClientResult<Vec<u8>> {
        self.execute_with_retries(cancel, request)
            .instrument(self.span.clone())
            .await
    }

    async fn execute_with_retries(
        &self,
        cancel: &CancellationToken,
        request: &ApiRequest,
    ) -> ClientResult<Vec<u8>> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire(cancel).await?;
        }

        let url = self.url_for(request)?;
        tracing::debug!(
            method = %request.method,
            path = url.path(),
            url = %url,
            "sending request"
        );

        let mut retry = 0;
        loop {
            let started = Instant::now();
            match self.attempt(cancel, request, &url).await {
                Ok(response) => {
                    tracing::debug!(
                        status = response.status.as_u16(),
                        body_size = response.body.len(),
                        elapsed_ms = duration_ms(started.elapsed()),
                        "received response"
                    );
                    if retry < self.retry.max_retries
                        && RetryPolicy::is_retryable_status(response.status)
                    {
                        let delay = self
                            .retry
                            .backoff(retry, retry_after(response.status, &response.headers));
                        tracing::debug!(
                            retry = retry + 1,
                            status = response.status.as_u16(),
                            delay_ms = duration_ms(delay),
                            "retrying request"
                        );
                        pause(cancel, delay).await?;
                        retry += 1;
                        continue;
                    }
                    return finish(response);
                }
                Err(ClientError::Transport { source })
                    if retry < self.retry.max_retries
                        && RetryPolicy::is_retryable_transport(&source) =>
                {
                    let delay = self.retry.backoff(retry, None);
                    tracing::debug!(
                        retry = retry + 1,
                        error = %source,
                        delay_ms = duration_ms(delay),
                        "retrying request"
                    );
                    pause(cancel, delay).await?;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(
        &self,
        cancel: &CancellationToken,
        request: &ApiRequest,
        url: &Url,
    ) -> ClientResult<RawResponse> {
        let mut builder = self.http.request(request.method.clone(), url.clone());
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, APPLICATION_JSON)
                .body(body.clone());
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = builder.send() => result.map_err(|source| ClientError::Transport { source })?,
        };
        let status = response.status();
        let headers = response.headers().clone();
        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = response.bytes() => result.map_err(|source| ClientError::Transport { source })?,
        };

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    fn url_for(&self, request: &ApiRequest) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::config("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(request.segments.iter());
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

fn finish(response: RawResponse) -> ClientResult<Vec<u8>> {
    if response.status.as_u16() >= 400 {
        return Err(ClientError::Api(ApiError::from_response(
            response.status.as_u16(),
            &response.body,
        )));
    }
    Ok(response.body)
}

async fn pause(cancel: &CancellationToken, delay: Duration) -> ClientResult<()> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ClientError::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
