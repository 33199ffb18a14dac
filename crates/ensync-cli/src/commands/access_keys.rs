//! `access-key` subcommands.

use ensync_api_models::{Permissions, VerifyResult};
use ensync_client::{AccessKeyService, CancellationToken};
use serde::Deserialize;

use crate::cli::{AccessKeyCreateArgs, AccessKeyListArgs, KeyArgs, PermissionsInput, PermissionsSetArgs};
use crate::client::{CliError, CliResult};
use crate::commands::read_json_input;
use crate::output::CommandOutput;

/// `{"send": [...], "receive": [...]}` exactly; both lists required.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PermissionLists {
    send: Vec<String>,
    receive: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WrappedPermissions {
    permissions: PermissionLists,
}

/// Accepted permission documents: `{"permissions": {...}}` or the bare
/// lists. Anything else is rejected rather than read as empty lists.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PermissionsDocument {
    Wrapped(WrappedPermissions),
    Flat(PermissionLists),
}

impl From<PermissionsDocument> for Permissions {
    fn from(document: PermissionsDocument) -> Self {
        let (PermissionsDocument::Wrapped(WrappedPermissions { permissions: lists })
        | PermissionsDocument::Flat(lists)) = document;
        Self {
            send: lists.send,
            receive: lists.receive,
        }
    }
}

fn read_permissions(input: &PermissionsInput) -> CliResult<Option<Permissions>> {
    let document: Option<PermissionsDocument> =
        read_json_input(input.permissions.as_deref(), input.file.as_deref(), "permissions")?;
    Ok(document.map(Permissions::from))
}

fn require_key(key: &str) -> CliResult<&str> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::validation("access key is required"));
    }
    Ok(key)
}

pub(crate) async fn list<S: AccessKeyService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &AccessKeyListArgs,
) -> CliResult<CommandOutput> {
    let mut params = args.list.to_params();
    if let Some(key) = args.key.as_deref().map(str::trim).filter(|key| !key.is_empty()) {
        params = params.with_filter("accessKey", key);
    }
    let keys = service.list_access_keys(cancel, &params).await?;
    CommandOutput::json(&keys)
}

pub(crate) async fn create<S: AccessKeyService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &AccessKeyCreateArgs,
) -> CliResult<CommandOutput> {
    let permissions = read_permissions(&args.input)?.unwrap_or_default();
    let created = service.create_access_key(cancel, &permissions).await?;
    CommandOutput::json(&created)
}

pub(crate) async fn verify<S: AccessKeyService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &KeyArgs,
) -> CliResult<CommandOutput> {
    let key = require_key(&args.key)?;
    let valid = service.verify_access_key(cancel, key).await?;
    CommandOutput::json(&VerifyResult {
        valid,
        key: key.to_string(),
    })
}

pub(crate) async fn get_permissions<S: AccessKeyService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &KeyArgs,
) -> CliResult<CommandOutput> {
    let key = require_key(&args.key)?;
    let permissions = service.get_access_key_permissions(cancel, key).await?;
    CommandOutput::json(&permissions)
}

pub(crate) async fn set_permissions<S: AccessKeyService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &PermissionsSetArgs,
) -> CliResult<CommandOutput> {
    let key = require_key(&args.key)?;
    let permissions = read_permissions(&args.input)?
        .ok_or_else(|| CliError::validation("permissions are required (pass --permissions or --file)"))?;
    service
        .set_access_key_permissions(cancel, key, &permissions)
        .await?;
    Ok(CommandOutput::message("Permissions updated successfully"))
}
