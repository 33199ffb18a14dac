//! Event endpoints.

use async_trait::async_trait;
use ensync_api_models::{Event, EventList, EventWriteRequest, ListParams};
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::params::{EVENT_FILTERS, list_query};
use crate::service::EventService;
use crate::transport::ApiRequest;

const EVENT: &str = "event";

#[async_trait]
impl EventService for ApiClient {
    async fn list_events(
        &self,
        cancel: &CancellationToken,
        params: &ListParams,
    ) -> ClientResult<EventList> {
        let request = ApiRequest::get(&[EVENT]).with_query(list_query(params, EVENT_FILTERS));
        self.fetch_json(cancel, &request)
            .await
            .map_err(|err| err.context("list events"))
    }

    async fn get_event(&self, cancel: &CancellationToken, name: &str) -> ClientResult<Event> {
        if name.trim().is_empty() {
            return Err(ClientError::invalid_request("event name is required").context("get event"));
        }
        self.fetch_json(cancel, &ApiRequest::get(&[EVENT, name]))
            .await
            .map_err(|err| err.context("get event"))
    }

    async fn create_event(&self, cancel: &CancellationToken, event: &Event) -> ClientResult<()> {
        let request = create_request(event).map_err(|err| err.context("create event"))?;
        self.send(cancel, &request)
            .await
            .map_err(|err| err.context("create event"))
    }

    async fn update_event(&self, cancel: &CancellationToken, event: &Event) -> ClientResult<()> {
        let request = update_request(event).map_err(|err| err.context("update event"))?;
        self.send(cancel, &request)
            .await
            .map_err(|err| err.context("update event"))
    }
}

fn create_request(event: &Event) -> ClientResult<ApiRequest> {
    if event.name.trim().is_empty() {
        return Err(ClientError::invalid_request("event name is required"));
    }
    ApiRequest::post(&[EVENT]).with_json(&EventWriteRequest::from(event))
}

fn update_request(event: &Event) -> ClientResult<ApiRequest> {
    let id = event
        .id
        .as_ref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ClientError::invalid_request("event id is required for update"))?
        .to_string();
    ApiRequest::put(&[EVENT, id.as_str()]).with_json(&EventWriteRequest::from(event))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::client::ClientConfig;
    use crate::retry::RetryPolicy;
    use anyhow::{Result, anyhow};
    use ensync_api_models::{EventId, SortOrder};
    use httpmock::prelude::*;
    use serde_json::json;

    const API_KEY: &str = "test-api-key";

    fn client_for(server: &MockServer) -> Result<ApiClient> {
        let base = server.url("/api/v1/ensync").parse()?;
        let config = ClientConfig::new(base, API_KEY).with_retry(RetryPolicy::disabled());
        Ok(ApiClient::new(config)?)
    }

    fn payload(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn list_events_sends_auth_and_pagination() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/ensync/event")
                    .header("x-api-key", API_KEY)
                    .header("accept", "application/json")
                    .query_param("pageIndex", "0")
                    .query_param("limit", "10")
                    .query_param("order", "DESC")
                    .query_param("orderBy", "createdAt");
                then.status(200).json_body(json!({
                    "resultsLength": 2,
                    "results": [
                        {"id": 1, "name": "orders/created", "payload": {"orderId": "string"}},
                        {"id": "evt-2", "name": "orders/shipped", "payload": {}}
                    ]
                }));
            })
            .await;

        let client = client_for(&server)?;
        let list = client
            .list_events(&CancellationToken::new(), &ListParams::default())
            .await?;

        mock.assert_async().await;
        assert_eq!(list.results_length, 2);
        assert_eq!(list.results.len(), 2);
        assert_eq!(list.results[0].id, Some(EventId::Numeric(1)));
        assert_eq!(list.results[0].name, "orders/created");
        assert_eq!(list.results[0].payload, payload(&[("orderId", "string")]));
        assert_eq!(list.results[1].id, Some(EventId::from("evt-2")));
        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_list_returns_api_error_without_result() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/ensync/event");
                then.status(401)
                    .json_body(json!({"message": "Invalid API key"}));
            })
            .await;

        let client = client_for(&server)?;
        let params = ListParams {
            order: SortOrder::Ascending,
            ..ListParams::default()
        };
        let err = client
            .list_events(&CancellationToken::new(), &params)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected an error"))?;

        assert_eq!(err.operation(), Some("list events"));
        let api = err.api_error().ok_or_else(|| anyhow!("expected API error"))?;
        assert_eq!(api.status, 401);
        assert!(api.message.contains("Invalid API key"));
        Ok(())
    }

    #[tokio::test]
    async fn get_event_fetches_by_name() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/ensync/event/orders-created");
                then.status(200).json_body(json!({
                    "id": 7,
                    "name": "orders-created",
                    "payload": {"sku": "string"},
                    "createdAt": "2024-05-01T10:00:00Z"
                }));
            })
            .await;

        let event = client_for(&server)?
            .get_event(&CancellationToken::new(), "orders-created")
            .await?;

        mock.assert_async().await;
        assert_eq!(event.name, "orders-created");
        assert!(event.created_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn create_event_posts_name_and_payload() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/ensync/event")
                    .header("content-type", "application/json")
                    .json_body(json!({"name": "billing/paid", "payload": {"amount": "number"}}));
                then.status(201);
            })
            .await;

        let event = Event::new("billing/paid", payload(&[("amount", "number")]));
        client_for(&server)?
            .create_event(&CancellationToken::new(), &event)
            .await?;

        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn update_event_puts_to_id_path() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/api/v1/ensync/event/42")
                    .json_body(json!({"name": "billing/refunded", "payload": {}}));
                then.status(200);
            })
            .await;

        let event = Event::new("billing/refunded", BTreeMap::new()).with_id(42_i64);
        client_for(&server)?
            .update_event(&CancellationToken::new(), &event)
            .await?;

        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn update_without_id_fails_before_io() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(200);
            })
            .await;

        let err = client_for(&server)?
            .update_event(
                &CancellationToken::new(),
                &Event::new("billing/refunded", BTreeMap::new()),
            )
            .await
            .err()
            .ok_or_else(|| anyhow!("expected an error"))?;

        assert!(matches!(err.root(), ClientError::InvalidRequest { .. }));
        assert_eq!(mock.hits_async().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn mismatched_body_is_a_decode_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/ensync/event");
                then.status(200).body("[1, 2, 3]");
            })
            .await;

        let err = client_for(&server)?
            .list_events(&CancellationToken::new(), &ListParams::default())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected an error"))?;

        assert!(matches!(err.root(), ClientError::Decode { .. }));
        assert_eq!(err.to_string(), "failed to list events");
        Ok(())
    }
}
