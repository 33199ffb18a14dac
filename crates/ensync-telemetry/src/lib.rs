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

//! Logging setup for the EnSync binaries.
//!
//! Libraries in this workspace only emit `tracing` events; installing a
//! subscriber is left to the binary through [`init_logging`].

mod init;

pub use init::{
    DEFAULT_LOG_LEVEL, DEBUG_LOG_LEVEL, LogFormat, LoggingConfig, init_logging,
    log_format_from_config,
};
