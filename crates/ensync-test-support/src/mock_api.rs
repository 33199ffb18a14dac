//! Stateful in-process implementation of the management API.
//!
//! Events and access keys live in memory so write-then-read sequences behave
//! like the real service. Every request is counted, authenticated against a
//! single API key and can be made to fail with queued status codes.

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use ensync_api_models::{
    AccessKey, AccessKeyCreateRequest, AccessKeyList, AccessKeyPermissions,
    AccessKeyVerifyResponse, DEFAULT_PAGE_LIMIT, Event, EventId, EventList, EventWriteRequest,
    Permissions,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Path prefix the routes are mounted under.
pub const BASE_PATH: &str = "/api/v1/ensync";

const HEADER_API_KEY: &str = "x-api-key";

#[derive(Debug, Default)]
struct Store {
    events: Vec<Event>,
    next_event_id: i64,
    access_keys: BTreeMap<String, Permissions>,
    next_access_key: u64,
    last_created_permissions: Option<Permissions>,
    queued_failures: VecDeque<u16>,
    hits: usize,
}

#[derive(Debug)]
struct MockState {
    api_key: String,
    store: Mutex<Store>,
}

impl MockState {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Running mock server. The server task is aborted on drop.
#[derive(Debug)]
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Bind an ephemeral local port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot be bound.
    pub async fn start(api_key: impl Into<String>) -> Result<Self> {
        let state = Arc::new(MockState {
            api_key: api_key.into(),
            store: Mutex::new(Store::default()),
        });
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .context("failed to bind mock API listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read mock API address")?;
        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// API root including [`BASE_PATH`].
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{BASE_PATH}", self.addr)
    }

    /// Key the server accepts.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.state.api_key
    }

    /// Answer the next requests with these statuses, in order, before any
    /// authentication or routing happens.
    pub fn fail_next(&self, statuses: impl IntoIterator<Item = u16>) {
        self.state.lock().queued_failures.extend(statuses);
    }

    /// Requests received so far, including rejected ones.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.state.lock().hits
    }

    /// Store an event and return the identifier assigned to it.
    pub fn seed_event(&self, name: &str, payload: BTreeMap<String, String>) -> EventId {
        self.state.lock().insert_event(name.to_string(), payload)
    }

    /// Register an existing access key.
    pub fn seed_access_key(&self, key: &str, permissions: Permissions) {
        self.state
            .lock()
            .access_keys
            .insert(key.to_string(), permissions);
    }

    /// Snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Permissions carried by the most recent create request.
    #[must_use]
    pub fn last_created_permissions(&self) -> Option<Permissions> {
        self.state.lock().last_created_permissions.clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl Store {
    fn insert_event(&mut self, name: String, payload: BTreeMap<String, String>) -> EventId {
        self.next_event_id += 1;
        let id = EventId::Numeric(self.next_event_id);
        self.events.push(Event {
            id: Some(id.clone()),
            name,
            payload,
            created_at: Some(Utc::now()),
            updated_at: None,
        });
        id
    }
}

fn router(state: Arc<MockState>) -> Router {
    let api = Router::new()
        .route("/event", get(list_events).post(create_event))
        .route("/event/{ident}", get(get_event).put(update_event))
        .route("/access-key", get(list_access_keys).post(create_access_key))
        .route(
            "/access-key/permissions/{key}",
            get(get_permissions).post(set_permissions),
        )
        .route("/access/verify/{key}", get(verify_access_key))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), gate))
        .with_state(state);
    Router::new().nest(BASE_PATH, api)
}

async fn gate(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let injected = {
        let mut store = state.lock();
        store.hits += 1;
        store.queued_failures.pop_front()
    };
    if let Some(status) = injected {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_response(status, "injected failure");
    }

    let presented = request
        .headers()
        .get(HEADER_API_KEY)
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.api_key.as_str()) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    next.run(request).await
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page_index: Option<usize>,
    limit: Option<usize>,
    access_key: Option<String>,
}

impl ListQuery {
    fn page<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT as usize);
        let start = self.page_index.unwrap_or(0).saturating_mul(limit);
        items.iter().skip(start).take(limit).cloned().collect()
    }
}

async fn list_events(
    State(state): State<Arc<MockState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let store = state.lock();
    let results = query.page(&store.events);
    Json(EventList {
        results_length: results.len(),
        results,
    })
    .into_response()
}

async fn get_event(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    let store = state.lock();
    store
        .events
        .iter()
        .find(|event| event.name == name)
        .map_or_else(
            || error_response(StatusCode::NOT_FOUND, "event not found"),
            |event| Json(event.clone()).into_response(),
        )
}

async fn create_event(
    State(state): State<Arc<MockState>>,
    Json(body): Json<EventWriteRequest>,
) -> Response {
    if body.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "name is required");
    }
    let id = state.lock().insert_event(body.name, body.payload);
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

async fn update_event(
    State(state): State<Arc<MockState>>,
    Path(ident): Path<String>,
    Json(body): Json<EventWriteRequest>,
) -> Response {
    let id = EventId::parse(&ident);
    let mut store = state.lock();
    let Some(event) = store
        .events
        .iter_mut()
        .find(|event| event.id.as_ref() == Some(&id))
    else {
        return error_response(StatusCode::NOT_FOUND, "event not found");
    };
    event.name = body.name;
    event.payload = body.payload;
    event.updated_at = Some(Utc::now());
    StatusCode::OK.into_response()
}

async fn list_access_keys(
    State(state): State<Arc<MockState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let store = state.lock();
    let matching: Vec<AccessKey> = store
        .access_keys
        .iter()
        .filter(|(key, _)| query.access_key.as_ref().is_none_or(|wanted| wanted == *key))
        .map(|(key, permissions)| AccessKey {
            key: key.clone(),
            permissions: Some(permissions.clone()),
            created_at: None,
        })
        .collect();
    let results = query.page(&matching);
    Json(AccessKeyList {
        results_length: results.len(),
        results,
    })
    .into_response()
}

async fn create_access_key(
    State(state): State<Arc<MockState>>,
    Json(body): Json<AccessKeyCreateRequest>,
) -> Response {
    let mut store = state.lock();
    store.next_access_key += 1;
    let key = format!("access-key-{}", store.next_access_key);
    store
        .access_keys
        .insert(key.clone(), body.permissions.clone());
    store.last_created_permissions = Some(body.permissions);
    Json(json!({ "accessKey": key })).into_response()
}

async fn get_permissions(
    State(state): State<Arc<MockState>>,
    Path(key): Path<String>,
) -> Response {
    let store = state.lock();
    store.access_keys.get(&key).map_or_else(
        || error_response(StatusCode::NOT_FOUND, "access key not found"),
        |permissions| {
            Json(AccessKeyPermissions {
                key: Some(key.clone()),
                permissions: permissions.clone(),
            })
            .into_response()
        },
    )
}

async fn set_permissions(
    State(state): State<Arc<MockState>>,
    Path(key): Path<String>,
    Json(body): Json<Permissions>,
) -> Response {
    let mut store = state.lock();
    match store.access_keys.get_mut(&key) {
        Some(permissions) => {
            *permissions = body;
            StatusCode::OK.into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "access key not found"),
    }
}

async fn verify_access_key(
    State(state): State<Arc<MockState>>,
    Path(key): Path<String>,
) -> Json<AccessKeyVerifyResponse> {
    let status = state.lock().access_keys.contains_key(&key);
    Json(AccessKeyVerifyResponse { status })
}
