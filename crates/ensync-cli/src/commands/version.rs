//! `version` subcommand. Needs no configuration or network access.

use ensync_api_models::VersionInfo;

use crate::cli::VersionArgs;
use crate::client::CliResult;
use crate::output::CommandOutput;

/// Build metadata; commit and date are stamped through environment variables
/// at compile time when available.
pub(crate) fn current() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: option_env!("ENSYNC_GIT_COMMIT").unwrap_or("none").to_string(),
        build_date: option_env!("ENSYNC_BUILD_DATE")
            .unwrap_or("unknown")
            .to_string(),
    }
}

pub(crate) fn show(args: &VersionArgs) -> CliResult<CommandOutput> {
    let info = current();
    if args.json {
        CommandOutput::json(&info)
    } else {
        Ok(CommandOutput::message(info.to_string()))
    }
}
