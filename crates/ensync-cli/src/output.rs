//! Rendering of command results.

use anyhow::anyhow;
use serde::Serialize;

use crate::client::{CliError, CliResult};

/// What a command prints to stdout on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommandOutput {
    /// Pretty-printed JSON document.
    Json(String),
    /// One-line confirmation.
    Message(String),
}

impl CommandOutput {
    pub(crate) fn json<T: Serialize + ?Sized>(value: &T) -> CliResult<Self> {
        serde_json::to_string_pretty(value)
            .map(Self::Json)
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
    }

    pub(crate) fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    pub(crate) fn text(&self) -> &str {
        match self {
            Self::Json(text) | Self::Message(text) => text,
        }
    }

    pub(crate) fn print(&self) {
        println!("{}", self.text());
    }
}
