//! Capability traits for the API surface.
//!
//! Command handlers depend on these rather than on [`crate::ApiClient`] so
//! test doubles can stand in for HTTP.

use async_trait::async_trait;
use ensync_api_models::{
    AccessKey, AccessKeyList, AccessKeyPermissions, Event, EventList, ListParams, Permissions,
};
use tokio_util::sync::CancellationToken;

use crate::error::ClientResult;

/// Event definition operations.
#[async_trait]
pub trait EventService: Send + Sync {
    /// One page of events.
    async fn list_events(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ClientResult<EventList>;

    /// Fetch an event by name.
    async fn get_event(&self, cancel: &CancellationToken, name: &str) -> ClientResult<Event>;

    /// Create an event from its name and payload.
    async fn create_event(&self, cancel: &CancellationToken, event: &Event) -> ClientResult<()>;

    /// Replace the name and payload of the event identified by `event.id`.
    async fn update_event(&self, cancel: &CancellationToken, event: &Event) -> ClientResult<()>;
}

/// Access key operations.
#[async_trait]
pub trait AccessKeyService: Send + Sync {
    /// One page of access keys, optionally filtered by `accessKey`.
    async fn list_access_keys(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ClientResult<AccessKeyList>;

    /// Issue a new key with the given permissions.
    async fn create_access_key(
        &self,
        cancel: &CancellationToken,
        permissions: &Permissions,
    ) -> ClientResult<AccessKey>;

    /// Whether the server recognises `key`.
    async fn verify_access_key(&self, cancel: &CancellationToken, key: &str) -> ClientResult<bool>;

    /// Current permissions of `key`.
    async fn get_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> ClientResult<AccessKeyPermissions>;

    /// Replace the permissions of `key`.
    async fn set_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        key: &str,
        permissions: &Permissions,
    ) -> ClientResult<()>;
}

/// Everything the CLI needs from a backend.
pub trait ApiService: EventService + AccessKeyService {}

impl<T: EventService + AccessKeyService> ApiService for T {}
