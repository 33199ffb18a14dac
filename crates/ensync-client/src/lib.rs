#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::redundant_pub_crate)]

//! HTTP client for the EnSync event and access-key management API.
//!
//! Layout:
//! - `client.rs`: [`ApiClient`] and its [`ClientConfig`]
//! - `transport.rs`: request execution with auth, rate limiting and retries
//! - `limiter.rs` / `retry.rs`: token bucket and backoff policy
//! - `events.rs` / `access_keys.rs`: per-resource request builders
//! - `service.rs`: capability traits implemented by [`ApiClient`]
//! - `error.rs`: [`ClientError`] taxonomy

mod access_keys;
mod client;
pub mod error;
mod events;
pub mod limiter;
mod params;
pub mod retry;
pub mod service;
mod transport;

pub use client::{ApiClient, ClientConfig, DEFAULT_TIMEOUT};
pub use error::{ApiError, ClientError, ClientResult};
pub use limiter::{RateLimit, RateLimiter};
pub use retry::RetryPolicy;
pub use service::{AccessKeyService, ApiService, EventService};
pub use tokio_util::sync::CancellationToken;
