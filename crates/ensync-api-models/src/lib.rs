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
//! Shared HTTP DTOs for the EnSync management API.
//!
//! These types are used by the client library for request/response encoding
//! and by the CLI for rendering, so the wire contract lives in one place.
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size used by list commands.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Identifier assigned to an event definition by the server.
///
/// Older deployments return numeric identifiers while newer ones use opaque
/// strings, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    /// Numeric identifier.
    Numeric(i64),
    /// Opaque string identifier.
    Text(String),
}

impl EventId {
    /// Parse a user-supplied identifier.
    ///
    /// Only canonical decimal text becomes [`EventId::Numeric`]; anything
    /// that would render differently (`007`, `+5`) is kept verbatim.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(value) if value.to_string() == trimmed => Self::Numeric(value),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// Returns `true` when the identifier carries no usable value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Numeric(_) => false,
            Self::Text(text) => text.trim().is_empty(),
        }
    }
}

impl Display for EventId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(formatter, "{value}"),
            Self::Text(value) => formatter.write_str(value),
        }
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Named event definition with a flat payload schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Server-assigned identifier; absent on events not yet created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    /// Unique event name.
    pub name: String,
    /// Payload schema expressed as field name to type/description pairs.
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
    /// Creation timestamp when reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp when reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Construct an event definition that has not been persisted yet.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: BTreeMap<String, String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            payload,
            created_at: None,
            updated_at: None,
        }
    }

    /// Attach an identifier, typically before issuing an update.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Body sent when creating or updating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWriteRequest {
    /// Event name.
    pub name: String,
    /// Payload schema.
    pub payload: BTreeMap<String, String>,
}

impl From<&Event> for EventWriteRequest {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            payload: event.payload.clone(),
        }
    }
}

/// Paginated list of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    /// Total number of results reported by the server.
    #[serde(default)]
    pub results_length: usize,
    /// Events on the requested page.
    #[serde(default)]
    pub results: Vec<Event>,
}

/// Capability lists attached to an access key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Event names the key may publish.
    #[serde(default)]
    pub send: Vec<String>,
    /// Event names the key may subscribe to.
    #[serde(default)]
    pub receive: Vec<String>,
}

impl Permissions {
    /// Build a permission set from send/receive lists.
    #[must_use]
    pub fn new<S, R>(send: S, receive: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            send: send.into_iter().map(Into::into).collect(),
            receive: receive.into_iter().map(Into::into).collect(),
        }
    }
}

/// Access key record as returned by list and create operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    /// Opaque credential string generated by the server.
    #[serde(rename = "accessKey", alias = "key")]
    pub key: String,
    /// Permissions granted to the key, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    /// Creation timestamp; the server does not always report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body sent when requesting a new access key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyCreateRequest {
    /// Desired permissions for the generated key.
    pub permissions: Permissions,
}

/// Response returned when the server generates an access key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyCreateResponse {
    /// Generated key.
    pub access_key: String,
    /// Creation timestamp when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Permissions attached to a specific key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyPermissions {
    /// Key the permissions belong to, when echoed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Permission lists.
    pub permissions: Permissions,
}

/// Paginated list of access keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyList {
    /// Total number of results reported by the server.
    #[serde(default)]
    pub results_length: usize,
    /// Keys on the requested page.
    #[serde(default)]
    pub results: Vec<AccessKey>,
}

/// Response of the access-key verification endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyVerifyResponse {
    /// Whether the key is valid.
    pub status: bool,
}

/// Outcome of an access-key verification rendered by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    /// Whether the server accepted the key.
    pub valid: bool,
    /// Key that was verified.
    pub key: String,
}

/// Sort direction for list operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order.
    #[serde(rename = "ASC")]
    Ascending,
    /// Descending order.
    #[default]
    #[serde(rename = "DESC")]
    Descending,
}

impl SortOrder {
    /// Wire representation of the sort direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Field used to order list results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderField {
    /// Order by name.
    #[serde(rename = "name")]
    Name,
    /// Order by creation time.
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl OrderField {
    /// Wire representation of the ordering field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "createdAt",
        }
    }
}

/// Pagination and sort descriptor for list operations.
///
/// Ranges are not validated client-side; the server is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Zero-based page index.
    pub page_index: u32,
    /// Page size.
    pub limit: u32,
    /// Sort direction.
    pub order: SortOrder,
    /// Sort field.
    pub order_by: OrderField,
    /// Optional equality filters keyed by query parameter name.
    pub filter: BTreeMap<String, String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page_index: 0,
            limit: DEFAULT_PAGE_LIMIT,
            order: SortOrder::default(),
            order_by: OrderField::default(),
            filter: BTreeMap::new(),
        }
    }
}

impl ListParams {
    /// Add an equality filter.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }
}

/// Build metadata reported by the `version` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Semantic version of the binary.
    pub version: String,
    /// Commit hash the binary was built from.
    pub commit: String,
    /// Build date.
    pub build_date: String,
}

impl Display for VersionInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Version: {}\nCommit: {}\nBuild Date: {}",
            self.version, self.commit, self.build_date
        )
    }
}
