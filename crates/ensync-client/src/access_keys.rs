//! Access key endpoints.

use async_trait::async_trait;
use ensync_api_models::{
    AccessKey, AccessKeyCreateRequest, AccessKeyCreateResponse, AccessKeyList,
    AccessKeyPermissions, AccessKeyVerifyResponse, ListParams, Permissions,
};
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::params::{ACCESS_KEY_FILTERS, list_query};
use crate::service::AccessKeyService;
use crate::transport::ApiRequest;

const ACCESS_KEY: &str = "access-key";
const PERMISSIONS: &str = "permissions";

fn require_key(key: &str) -> ClientResult<&str> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ClientError::invalid_request("access key is required"));
    }
    Ok(key)
}

#[async_trait]
impl AccessKeyService for ApiClient {
    async fn list_access_keys(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ClientResult<AccessKeyList> {
        let request =
            ApiRequest::get(&[ACCESS_KEY]).with_query(list_query(params, ACCESS_KEY_FILTERS));
        self.fetch_json(cancel, &request)
            .await
            .map_err(|err| err.context("list access keys"))
    }

    async fn create_access_key(
        &self,
        cancel: &CancellationToken,
        permissions: &Permissions,
    ) -> ClientResult<AccessKey> {
        let body = AccessKeyCreateRequest {
            permissions: permissions.clone(),
        };
        let request = ApiRequest::post(&[ACCESS_KEY])
            .with_json(&body)
            .map_err(|err| err.context("create access key"))?;
        let created: AccessKeyCreateResponse = self
            .fetch_json(cancel, &request)
            .await
            .map_err(|err| err.context("create access key"))?;
        Ok(AccessKey {
            key: created.access_key,
            permissions: Some(body.permissions),
            created_at: created.created_at,
        })
    }

    async fn verify_access_key(&self, cancel: &CancellationToken, key: &str) -> ClientResult<bool> {
        let key = require_key(key).map_err(|err| err.context("verify access key"))?;
        let response: AccessKeyVerifyResponse = self
            .fetch_json(cancel, &ApiRequest::get(&["access", "verify", key]))
            .await
            .map_err(|err| err.context("verify access key"))?;
        Ok(response.status)
    }

    async fn get_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        key: &str,
    ) -> ClientResult<AccessKeyPermissions> {
        let key = require_key(key).map_err(|err| err.context("get access key permissions"))?;
        let mut found: AccessKeyPermissions = self
            .fetch_json(cancel, &ApiRequest::get(&[ACCESS_KEY, PERMISSIONS, key]))
            .await
            .map_err(|err| err.context("get access key permissions"))?;
        if found.key.is_none() {
            found.key = Some(key.to_string());
        }
        Ok(found)
    }

    async fn set_access_key_permissions(
        &self,
        cancel: &CancellationToken,
        key: &str,
        permissions: &Permissions,
    ) -> ClientResult<()> {
        let request = require_key(key)
            .and_then(|key| ApiRequest::post(&[ACCESS_KEY, PERMISSIONS, key]).with_json(permissions))
            .map_err(|err| err.context("set access key permissions"))?;
        self.send(cancel, &request)
            .await
            .map_err(|err| err.context("set access key permissions"))
    }
}
