//! Scripted controller for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::client::{check_status, Controller, Method};
use crate::error::Result;
use crate::resource::{resource_id, Resource};

/// A request seen by [`MockController`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// In-memory controller.
///
/// Objects created by a POST exist for later GETs. Statuses can be forced
/// per (method, path), and every call can be held behind [`pause`].
///
/// [`pause`]: MockController::pause
#[derive(Default)]
pub struct MockController {
    calls: Mutex<Vec<Call>>,
    present: Mutex<HashSet<String>>,
    forced: Mutex<HashMap<(Method, String), u16>>,
    gate: Arc<RwLock<()>>,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an object path as existing on the controller.
    pub fn seed(&self, path: &str) {
        self.present.lock().unwrap().insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.present.lock().unwrap().contains(path)
    }

    /// Answer every `method path` with `status`.
    pub fn force_status(&self, method: Method, path: &str, status: u16) {
        self.forced
            .lock()
            .unwrap()
            .insert((method, path.to_string()), status);
    }

    pub fn clear_forced(&self) {
        self.forced.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with(&self, method: Method) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Hold all calls until the returned guard is dropped. Calls are recorded
    /// before they block.
    pub async fn pause(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.gate).write_owned().await
    }

    /// Wait until at least `n` calls were recorded.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn store(&self, collection: &str, body: Option<&Value>) -> u16 {
        let mut created: Vec<&Resource> = Vec::new();
        if let Some(Value::Object(envelope)) = body {
            for value in envelope.values() {
                match value {
                    Value::Object(resource) => created.push(resource),
                    Value::Array(items) => created.extend(items.iter().filter_map(Value::as_object)),
                    _ => {}
                }
            }
        }

        let mut present = self.present.lock().unwrap();
        let paths: Vec<String> = created
            .iter()
            .filter_map(|r| resource_id(r))
            .map(|id| format!("{}/{}", collection, id))
            .collect();
        if paths.iter().any(|p| present.contains(p)) {
            return 400;
        }
        present.extend(paths);
        201
    }

    fn respond(&self, method: Method, path: &str, body: Option<&Value>) -> u16 {
        if let Some(status) = self.forced.lock().unwrap().get(&(method, path.to_string())) {
            return *status;
        }
        match method {
            Method::Get | Method::Put => {
                if self.contains(path) {
                    200
                } else {
                    404
                }
            }
            Method::Post => self.store(path, body),
            Method::Delete => {
                if self.present.lock().unwrap().remove(path) {
                    204
                } else {
                    404
                }
            }
        }
    }
}

#[async_trait]
impl Controller for MockController {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        ignore: &[u16],
    ) -> Result<()> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        let _open = self.gate.read().await;

        let status = self.respond(method, path, body);
        check_status(method, path, status, ignore)
    }
}

/// Build a resource from a JSON object literal.
pub fn resource(value: Value) -> Resource {
    value.as_object().cloned().unwrap_or_default()
}

/// Small topology: one network, two subnets, one port with two groups.
pub async fn sample_db() -> crate::db::MemoryDb {
    use crate::resource::ResourceType;

    let db = crate::db::MemoryDb::new();
    db.upsert(
        ResourceType::Network,
        resource(json!({
            "id": "net-1",
            "name": "blue",
            "status": "ACTIVE",
            "subnets": ["sub-1", "sub-2"],
            "tenant_id": "t-1"
        })),
    )
    .await;
    for (id, cidr) in [("sub-1", "10.0.0.0/24"), ("sub-2", "10.0.1.0/24")] {
        db.upsert(
            ResourceType::Subnet,
            resource(json!({
                "id": id,
                "network_id": "net-1",
                "ip_version": 4,
                "cidr": cidr,
                "tenant_id": "t-1"
            })),
        )
        .await;
    }
    db.upsert(
        ResourceType::Port,
        resource(json!({
            "id": "port-1",
            "network_id": "net-1",
            "mac_address": "fa:16:3e:00:00:01",
            "status": "DOWN",
            "security_groups": ["sg-1", "sg-2"],
            "tenant_id": "t-1"
        })),
    )
    .await;
    db.upsert_security_group(resource(json!({"id": "sg-1", "name": "default"})))
        .await;
    db.upsert_security_group(resource(json!({"id": "sg-2", "name": "web"})))
        .await;
    db
}
