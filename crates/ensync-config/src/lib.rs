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

//! Layered configuration for the EnSync CLI.
//!
//! Layout: `model.rs` (file document, overrides, resolved settings),
//! `loader.rs` (defaults → YAML file → environment → overrides),
//! `defaults.rs` (default values and variable names), `error.rs`.

mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use defaults::{
    CONFIG_FILE_NAME, DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_RPS,
    DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_BASE_URL, ENV_CONFIG_DIR, ENV_DEBUG, ENV_LOG_FORMAT,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{default_config_dir, load, load_with_env};
pub use model::{ConfigOverrides, FileConfig, Settings};
