//! Command handlers grouped by resource, plus JSON input helpers shared by
//! the write commands.

pub(crate) mod access_keys;
pub(crate) mod events;
pub(crate) mod version;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::client::{CliError, CliResult};

/// Parse a JSON document given inline or as a file path; `None` when
/// neither was supplied.
pub(crate) fn read_json_input<T: DeserializeOwned>(
    inline: Option<&str>,
    file: Option<&Path>,
    what: &str,
) -> CliResult<Option<T>> {
    let (raw, origin) = match (inline, file) {
        (Some(_), Some(_)) => {
            return Err(CliError::validation(format!(
                "{what} may be given inline or as a file, not both"
            )));
        }
        (Some(inline), None) => (inline.to_string(), "inline value".to_string()),
        (None, Some(path)) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {what} file {}", path.display()))
                .map_err(|err| CliError::validation(format!("{err:#}")))?;
            (raw, path.display().to_string())
        }
        (None, None) => return Ok(None),
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| CliError::validation(format!("failed to parse {what} JSON ({origin}): {err}")))
}
