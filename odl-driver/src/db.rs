//! Read access to the network resource database.
//!
//! The database is the source of truth; the driver only reads from it.
//! [`MemoryDb`] holds a snapshot in memory and backs the CLI and tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{DriverError, Result};
use crate::resource::{resource_id, Resource, ResourceType};

/// Database-facing interface.
#[async_trait]
pub trait ResourceDb: Send + Sync {
    /// All resources of a type.
    async fn list_all(&self, ty: ResourceType) -> Result<Vec<Resource>>;

    /// One resource, or [`DriverError::NotFound`].
    async fn get_by_id(&self, ty: ResourceType, id: &str) -> Result<Resource>;

    /// One security group, or [`DriverError::NotFound`].
    async fn get_security_group(&self, id: &str) -> Result<Resource>;
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub networks: Vec<Resource>,
    #[serde(default)]
    pub subnets: Vec<Resource>,
    #[serde(default)]
    pub ports: Vec<Resource>,
    #[serde(default)]
    pub security_groups: Vec<Resource>,
}

#[derive(Default)]
struct Tables {
    resources: HashMap<ResourceType, Vec<Resource>>,
    security_groups: Vec<Resource>,
}

fn find<'a>(rows: &'a [Resource], id: &str) -> Option<&'a Resource> {
    rows.iter().find(|r| resource_id(r) == Some(id))
}

fn upsert_row(rows: &mut Vec<Resource>, resource: Resource) {
    let id = resource_id(&resource).map(str::to_owned);
    match rows
        .iter_mut()
        .find(|r| id.is_some() && resource_id(r) == id.as_deref())
    {
        Some(existing) => *existing = resource,
        None => rows.push(resource),
    }
}

/// In-memory [`ResourceDb`].
#[derive(Default)]
pub struct MemoryDb {
    tables: RwLock<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut resources = HashMap::new();
        resources.insert(ResourceType::Network, snapshot.networks);
        resources.insert(ResourceType::Subnet, snapshot.subnets);
        resources.insert(ResourceType::Port, snapshot.ports);
        Self {
            tables: RwLock::new(Tables {
                resources,
                security_groups: snapshot.security_groups,
            }),
        }
    }

    /// Load a JSON snapshot file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read(path.as_ref()).await?;
        let snapshot: Snapshot = serde_json::from_slice(&raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Insert or replace a resource by id.
    pub async fn upsert(&self, ty: ResourceType, resource: Resource) {
        let mut tables = self.tables.write().await;
        upsert_row(tables.resources.entry(ty).or_default(), resource);
    }

    /// Remove a resource, returning it if it existed.
    pub async fn remove(&self, ty: ResourceType, id: &str) -> Option<Resource> {
        let mut tables = self.tables.write().await;
        let rows = tables.resources.get_mut(&ty)?;
        let pos = rows.iter().position(|r| resource_id(r) == Some(id))?;
        Some(rows.remove(pos))
    }

    pub async fn upsert_security_group(&self, group: Resource) {
        let mut tables = self.tables.write().await;
        upsert_row(&mut tables.security_groups, group);
    }
}

#[async_trait]
impl ResourceDb for MemoryDb {
    async fn list_all(&self, ty: ResourceType) -> Result<Vec<Resource>> {
        let tables = self.tables.read().await;
        Ok(tables.resources.get(&ty).cloned().unwrap_or_default())
    }

    async fn get_by_id(&self, ty: ResourceType, id: &str) -> Result<Resource> {
        let tables = self.tables.read().await;
        tables
            .resources
            .get(&ty)
            .and_then(|rows| find(rows, id))
            .cloned()
            .ok_or_else(|| DriverError::NotFound {
                kind: ty.singular(),
                id: id.to_string(),
            })
    }

    async fn get_security_group(&self, id: &str) -> Result<Resource> {
        let tables = self.tables.read().await;
        find(&tables.security_groups, id)
            .cloned()
            .ok_or_else(|| DriverError::NotFound {
                kind: "security_group",
                id: id.to_string(),
            })
    }
}
