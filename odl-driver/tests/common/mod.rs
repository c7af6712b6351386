//! Shared test utilities for odl-driver integration tests.
//!
//! [`TestController`] is a minimal controller northbound API served by axum:
//! collections of JSON objects keyed by id, 400 on duplicate create, 404 on
//! unknown objects, 401 without credentials. Statuses can be forced per
//! (method, path) to inject failures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use odl_driver::{OdlConfig, Resource};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A request the controller received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub cookie: Option<String>,
}

#[derive(Default)]
pub struct ControllerState {
    objects: Mutex<HashMap<String, HashMap<String, Value>>>,
    requests: Mutex<Vec<Recorded>>,
    forced: Mutex<HashMap<(&'static str, String), u16>>,
}

impl ControllerState {
    fn record(&self, method: &'static str, path: String, body: Option<Value>, headers: &HeaderMap) {
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            body,
            cookie,
        });
    }

    fn forced(&self, method: &'static str, path: &str) -> Option<StatusCode> {
        self.forced
            .lock()
            .unwrap()
            .get(&(method, path.to_string()))
            .and_then(|s| StatusCode::from_u16(*s).ok())
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "))
}

fn with_session(status: StatusCode) -> Response {
    (
        status,
        [(header::SET_COOKIE, "JSESSIONID=test-session; Path=/")],
    )
        .into_response()
}

/// Objects carried by a create envelope: a single object or an array.
fn envelope_objects(body: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    if let Some(envelope) = body.as_object() {
        for value in envelope.values() {
            match value {
                Value::Object(_) => out.push(value.clone()),
                Value::Array(items) => out.extend(items.iter().filter(|v| v.is_object()).cloned()),
                _ => {}
            }
        }
    }
    out
}

async fn create(
    State(state): State<Arc<ControllerState>>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", collection.clone(), Some(body.clone()), &headers);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = state.forced("POST", &collection) {
        return with_session(status);
    }

    let created = envelope_objects(&body);
    let mut objects = state.objects.lock().unwrap();
    let table = objects.entry(collection).or_default();
    let ids: Vec<String> = created
        .iter()
        .filter_map(|o| o.get("id").and_then(Value::as_str).map(str::to_owned))
        .collect();
    if ids.iter().any(|id| table.contains_key(id)) {
        return with_session(StatusCode::BAD_REQUEST);
    }
    for (id, object) in ids.into_iter().zip(created) {
        table.insert(id, object);
    }
    with_session(StatusCode::CREATED)
}

async fn show(
    State(state): State<Arc<ControllerState>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let path = format!("{}/{}", collection, id);
    state.record("GET", path.clone(), None, &headers);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = state.forced("GET", &path) {
        return with_session(status);
    }

    let objects = state.objects.lock().unwrap();
    match objects.get(&collection).and_then(|t| t.get(&id)) {
        Some(object) => (StatusCode::OK, Json(object.clone())).into_response(),
        None => with_session(StatusCode::NOT_FOUND),
    }
}

async fn update(
    State(state): State<Arc<ControllerState>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("{}/{}", collection, id);
    state.record("PUT", path.clone(), Some(body.clone()), &headers);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = state.forced("PUT", &path) {
        return with_session(status);
    }

    let mut objects = state.objects.lock().unwrap();
    let Some(existing) = objects.get_mut(&collection).and_then(|t| t.get_mut(&id)) else {
        return with_session(StatusCode::NOT_FOUND);
    };
    for changes in envelope_objects(&body) {
        if let (Some(target), Some(changes)) = (existing.as_object_mut(), changes.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    with_session(StatusCode::OK)
}

async fn remove(
    State(state): State<Arc<ControllerState>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let path = format!("{}/{}", collection, id);
    state.record("DELETE", path.clone(), None, &headers);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = state.forced("DELETE", &path) {
        return with_session(status);
    }

    let mut objects = state.objects.lock().unwrap();
    match objects.get_mut(&collection).and_then(|t| t.remove(&id)) {
        Some(_) => with_session(StatusCode::NO_CONTENT),
        None => with_session(StatusCode::NOT_FOUND),
    }
}

/// Controller northbound API running on a local port.
pub struct TestController {
    pub addr: SocketAddr,
    pub state: Arc<ControllerState>,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestController {
    /// Spawn a controller on an OS-assigned port.
    pub async fn spawn() -> Self {
        let state = Arc::new(ControllerState::default());

        let router = Router::new()
            .route("/neutron/{collection}", post(create))
            .route(
                "/neutron/{collection}/{id}",
                get(show).put(update).delete(remove),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/neutron", self.addr)
    }

    pub fn config(&self) -> OdlConfig {
        OdlConfig::new(self.base_url(), "admin", "admin")
    }

    /// Pre-populate an object as if it had been created out of band.
    pub fn seed(&self, collection: &str, object: Value) {
        let id = object["id"].as_str().expect("seeded object needs an id").to_string();
        self.state
            .objects
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(id, object);
    }

    pub fn object(&self, collection: &str, id: &str) -> Option<Value> {
        self.state
            .objects
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|t| t.get(id))
            .cloned()
    }

    pub fn force_status(&self, method: &'static str, path: &str, status: u16) {
        self.state
            .forced
            .lock()
            .unwrap()
            .insert((method, path.to_string()), status);
    }

    pub fn clear_forced(&self) {
        self.state.forced.lock().unwrap().clear();
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_with(&self, method: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().unwrap().clear();
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Build a resource from a JSON object literal.
pub fn resource(value: Value) -> Resource {
    value.as_object().cloned().expect("resource must be an object")
}

/// Topology used by most tests: two networks, two subnets, one port.
pub fn snapshot() -> Value {
    json!({
        "networks": [
            {"id": "net-1", "name": "blue", "status": "ACTIVE", "subnets": ["sub-1", "sub-2"], "tenant_id": "t-1"},
            {"id": "net-2", "name": "red", "status": "ACTIVE", "subnets": [], "tenant_id": "t-1"}
        ],
        "subnets": [
            {"id": "sub-1", "network_id": "net-1", "ip_version": 4, "cidr": "10.0.0.0/24", "tenant_id": "t-1"},
            {"id": "sub-2", "network_id": "net-1", "ip_version": 4, "cidr": "10.0.1.0/24", "tenant_id": "t-1"}
        ],
        "ports": [
            {
                "id": "port-1",
                "network_id": "net-1",
                "mac_address": "fa:16:3e:12:34:56",
                "status": "DOWN",
                "security_groups": ["sg-1"],
                "fixed_ips": [{"subnet_id": "sub-1", "ip_address": "10.0.0.5"}],
                "tenant_id": "t-1"
            }
        ],
        "security_groups": [
            {"id": "sg-1", "name": "default", "security_group_rules": []}
        ]
    })
}
