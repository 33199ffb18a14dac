//! Argument parsing, settings resolution and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ensync_api_models::{DEFAULT_PAGE_LIMIT, ListParams, OrderField, SortOrder};
use ensync_client::{ApiService, CancellationToken};
use ensync_config::{ConfigOverrides, Settings};
use ensync_telemetry::{LogFormat, LoggingConfig, init_logging, log_format_from_config};

use crate::client::{CliResult, build_client};
use crate::commands::{access_keys, events, version};
use crate::output::CommandOutput;

/// Parses CLI arguments, executes the requested command and prints its
/// result. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(output) => {
            output.print();
            0
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<CommandOutput> {
    if let Command::Version(args) = &cli.command {
        return version::show(args);
    }

    let settings = ensync_config::load(&cli.overrides())?;
    install_logging(&settings);
    tracing::debug!(
        base_url = %settings.base_url,
        config_file = ?settings.source_file,
        "configuration resolved"
    );

    let client = build_client(&settings)?;
    let cancel = CancellationToken::new();
    let work = dispatch(&client, &cancel, cli.command);
    tokio::pin!(work);
    tokio::select! {
        result = &mut work => result,
        () = interrupted() => {
            cancel.cancel();
            work.await
        }
    }
}

fn install_logging(settings: &Settings) {
    let format =
        log_format_from_config(settings.log_format.as_deref()).unwrap_or_else(LogFormat::infer);
    if let Err(err) = init_logging(&LoggingConfig::for_cli(settings.debug, format)) {
        eprintln!("warning: {err:#}");
    }
}

async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

pub(crate) async fn dispatch<S: ApiService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    command: Command,
) -> CliResult<CommandOutput> {
    match command {
        Command::Event(event) => match event {
            EventCommand::List(args) => events::list(service, cancel, &args).await,
            EventCommand::Get(args) => events::get(service, cancel, &args).await,
            EventCommand::Create(args) => events::create(service, cancel, &args).await,
            EventCommand::Update(args) => events::update(service, cancel, &args).await,
        },
        Command::AccessKey(access_key) => match access_key {
            AccessKeyCommand::List(args) => access_keys::list(service, cancel, &args).await,
            AccessKeyCommand::Create(args) => access_keys::create(service, cancel, &args).await,
            AccessKeyCommand::Verify(args) => access_keys::verify(service, cancel, &args).await,
            AccessKeyCommand::Permissions(PermissionsCommand::Get(args)) => {
                access_keys::get_permissions(service, cancel, &args).await
            }
            AccessKeyCommand::Permissions(PermissionsCommand::Set(args)) => {
                access_keys::set_permissions(service, cancel, &args).await
            }
        },
        Command::Version(args) => version::show(&args),
    }
}

#[derive(Debug, Parser)]
#[command(name = "ensync", version, about = "EnSync CLI tool")]
pub(crate) struct Cli {
    /// Config file (default is $HOME/.ensync/config.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// API base URL.
    #[arg(long, global = true, env = "ENSYNC_BASE_URL")]
    pub(crate) base_url: Option<String>,
    /// API key sent in the X-API-KEY header.
    #[arg(long, global = true, env = "ENSYNC_API_KEY", hide_env_values = true)]
    pub(crate) api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub(crate) timeout: Option<u64>,
    /// Sustained request rate in requests per second.
    #[arg(long, global = true, value_name = "RPS")]
    pub(crate) rate_limit: Option<f64>,
    /// Rate limiter burst allowance.
    #[arg(long, global = true, value_name = "N")]
    pub(crate) burst: Option<u32>,
    /// Enable debug logging.
    #[arg(long, global = true)]
    pub(crate) debug: bool,
    /// Log output format.
    #[arg(long, global = true, value_enum)]
    pub(crate) log_format: Option<LogFormatArg>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    pub(crate) fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            debug: self.debug,
            timeout_secs: self.timeout,
            rate_limit_rps: self.rate_limit,
            rate_limit_burst: self.burst,
            log_format: self.log_format.map(|format| format.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormatArg {
    Pretty,
    Json,
}

impl LogFormatArg {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Manage events.
    #[command(subcommand)]
    Event(EventCommand),
    /// Manage access keys.
    #[command(subcommand)]
    AccessKey(AccessKeyCommand),
    /// Print the version information.
    Version(VersionArgs),
}

#[derive(Debug, Subcommand)]
pub(crate) enum EventCommand {
    /// List events.
    List(ListArgs),
    /// Fetch an event definition by name.
    Get(EventGetArgs),
    /// Create a new event definition.
    Create(EventCreateArgs),
    /// Update an existing event definition.
    Update(EventUpdateArgs),
}

#[derive(Debug, Subcommand)]
pub(crate) enum AccessKeyCommand {
    /// List access keys.
    List(AccessKeyListArgs),
    /// Create a new access key.
    Create(AccessKeyCreateArgs),
    /// Verify an access key.
    Verify(KeyArgs),
    /// Manage access key permissions.
    #[command(subcommand)]
    Permissions(PermissionsCommand),
}

#[derive(Debug, Subcommand)]
pub(crate) enum PermissionsCommand {
    /// Get access key permissions.
    Get(KeyArgs),
    /// Set access key permissions.
    Set(PermissionsSetArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OrderArg {
    #[value(name = "ASC")]
    Asc,
    #[value(name = "DESC")]
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => Self::Ascending,
            OrderArg::Desc => Self::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OrderByArg {
    #[value(name = "name")]
    Name,
    #[value(name = "createdAt")]
    CreatedAt,
}

impl From<OrderByArg> for OrderField {
    fn from(field: OrderByArg) -> Self {
        match field {
            OrderByArg::Name => Self::Name,
            OrderByArg::CreatedAt => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ListArgs {
    /// Page index.
    #[arg(long, default_value_t = 0)]
    pub(crate) page: u32,
    /// Number of items per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    pub(crate) limit: u32,
    /// Sort order.
    #[arg(long, value_enum, ignore_case = true, default_value_t = OrderArg::Desc)]
    pub(crate) order: OrderArg,
    /// Field to order by.
    #[arg(long, value_enum, default_value_t = OrderByArg::CreatedAt)]
    pub(crate) order_by: OrderByArg,
}

impl ListArgs {
    pub(crate) fn to_params(&self) -> ListParams {
        ListParams {
            page_index: self.page,
            limit: self.limit,
            order: self.order.into(),
            order_by: self.order_by.into(),
            ..ListParams::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct EventGetArgs {
    /// Event name.
    #[arg(long)]
    pub(crate) name: String,
}

/// Inline or file-based JSON document.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct PayloadInput {
    /// Payload as inline JSON object of field name to type.
    #[arg(long, conflicts_with = "payload_file", value_name = "JSON")]
    pub(crate) payload: Option<String>,
    /// Path to JSON file containing the payload.
    #[arg(long, value_name = "PATH")]
    pub(crate) payload_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct EventCreateArgs {
    /// Event name.
    #[arg(long)]
    pub(crate) name: String,
    #[command(flatten)]
    pub(crate) payload: PayloadInput,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct EventUpdateArgs {
    /// Event ID.
    #[arg(long)]
    pub(crate) id: String,
    /// New event name.
    #[arg(long)]
    pub(crate) name: String,
    #[command(flatten)]
    pub(crate) payload: PayloadInput,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct AccessKeyListArgs {
    #[command(flatten)]
    pub(crate) list: ListArgs,
    /// Filter by access key.
    #[arg(long)]
    pub(crate) key: Option<String>,
}

/// Permissions supplied inline or through a file.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct PermissionsInput {
    /// Permissions as inline JSON, e.g. '{"send":["a"],"receive":["b"]}'.
    #[arg(long, conflicts_with = "file", value_name = "JSON")]
    pub(crate) permissions: Option<String>,
    /// JSON file containing permissions.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub(crate) file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct AccessKeyCreateArgs {
    #[command(flatten)]
    pub(crate) input: PermissionsInput,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct KeyArgs {
    /// Access key.
    #[arg(long)]
    pub(crate) key: String,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct PermissionsSetArgs {
    /// Access key.
    #[arg(long)]
    pub(crate) key: String,
    #[command(flatten)]
    pub(crate) input: PermissionsInput,
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct VersionArgs {
    /// Output version information as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli> {
        Cli::try_parse_from(args).map_err(|err| anyhow!("{err}"))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_become_overrides() -> Result<()> {
        let cli = parse(&[
            "ensync",
            "event",
            "list",
            "--base-url",
            "https://api.example.com/v1",
            "--api-key",
            "secret",
            "--timeout",
            "5",
            "--rate-limit",
            "2.5",
            "--burst",
            "4",
            "--debug",
            "--log-format",
            "json",
        ])?;
        let overrides = cli.overrides();
        assert_eq!(overrides.base_url.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(overrides.api_key.as_deref(), Some("secret"));
        assert_eq!(overrides.timeout_secs, Some(5));
        assert_eq!(overrides.rate_limit_rps, Some(2.5));
        assert_eq!(overrides.rate_limit_burst, Some(4));
        assert!(overrides.debug);
        assert_eq!(overrides.log_format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn list_defaults_match_api_defaults() -> Result<()> {
        let cli = parse(&["ensync", "event", "list"])?;
        let Command::Event(EventCommand::List(args)) = cli.command else {
            return Err(anyhow!("expected event list"));
        };
        assert_eq!(args.to_params(), ListParams::default());
        Ok(())
    }

    #[test]
    fn list_sorting_flags_are_parsed() -> Result<()> {
        let cli = parse(&[
            "ensync",
            "access-key",
            "list",
            "--page",
            "2",
            "--limit",
            "25",
            "--order",
            "asc",
            "--order-by",
            "name",
            "--key",
            "abc",
        ])?;
        let Command::AccessKey(AccessKeyCommand::List(args)) = cli.command else {
            return Err(anyhow!("expected access-key list"));
        };
        let params = args.list.to_params();
        assert_eq!(params.page_index, 2);
        assert_eq!(params.limit, 25);
        assert_eq!(params.order, SortOrder::Ascending);
        assert_eq!(params.order_by, OrderField::Name);
        assert_eq!(args.key.as_deref(), Some("abc"));
        Ok(())
    }

    #[test]
    fn inline_and_file_payloads_conflict() {
        let result = Cli::try_parse_from([
            "ensync",
            "event",
            "create",
            "--name",
            "orders",
            "--payload",
            "{}",
            "--payload-file",
            "payload.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn nested_permission_commands_parse() -> Result<()> {
        let cli = parse(&[
            "ensync",
            "access-key",
            "permissions",
            "set",
            "--key",
            "k1",
            "-f",
            "perms.json",
        ])?;
        let Command::AccessKey(AccessKeyCommand::Permissions(PermissionsCommand::Set(args))) =
            cli.command
        else {
            return Err(anyhow!("expected permissions set"));
        };
        assert_eq!(args.key, "k1");
        assert_eq!(args.input.file, Some(PathBuf::from("perms.json")));
        Ok(())
    }

    #[test]
    fn required_flags_are_enforced() {
        assert!(Cli::try_parse_from(["ensync", "event", "get"]).is_err());
        assert!(Cli::try_parse_from(["ensync", "event", "update", "--name", "x"]).is_err());
        assert!(Cli::try_parse_from(["ensync", "access-key", "verify"]).is_err());
        assert!(Cli::try_parse_from(["ensync", "event", "list", "--order", "sideways"]).is_err());
    }
}
