//! Attribute filters shaping outbound payloads.
//!
//! | Type    | Create                                   | Update                                  |
//! |---------|------------------------------------------|-----------------------------------------|
//! | network | drop status, subnets                     | drop id, status, subnets, tenant_id     |
//! | subnet  | unchanged                                | drop id, network_id, ip_version, cidr,  |
//! |         |                                          | allocation_pools, tenant_id             |
//! | port    | expand security groups, uppercase MAC,   | expand security groups, drop network_id,|
//! |         | drop status                              | id, status, mac_address, tenant_id,     |
//! |         |                                          | fixed_ips                               |
//!
//! Security group expansion reads from the same [`ResourceDb`] handle as the
//! rest of the synchronisation call.

use serde_json::Value;

use crate::db::ResourceDb;
use crate::error::Result;
use crate::resource::{Operation, Resource, ResourceType};

const NETWORK_CREATE_DROP: &[&str] = &["status", "subnets"];
const NETWORK_UPDATE_DROP: &[&str] = &["id", "status", "subnets", "tenant_id"];
const SUBNET_UPDATE_DROP: &[&str] = &[
    "id",
    "network_id",
    "ip_version",
    "cidr",
    "allocation_pools",
    "tenant_id",
];
const PORT_CREATE_DROP: &[&str] = &["status"];
const PORT_UPDATE_DROP: &[&str] = &[
    "network_id",
    "id",
    "status",
    "mac_address",
    "tenant_id",
    "fixed_ips",
];

/// Remove keys if present.
pub fn drop_keys(resource: &mut Resource, keys: &[&str]) {
    for key in keys {
        resource.remove(*key);
    }
}

/// Uppercase `mac_address`. The controller compares MACs case-sensitively.
pub fn uppercase_mac_address(port: &mut Resource) {
    if let Some(Value::String(mac)) = port.get_mut("mac_address") {
        *mac = mac.to_uppercase();
    }
}

/// Replace security group ids with the full group records.
///
/// Entries that are not ids are passed through as they are. A port without
/// the attribute gets an empty list.
pub async fn expand_security_groups(port: &mut Resource, db: &dyn ResourceDb) -> Result<()> {
    let entries = match port.remove("security_groups") {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    };

    let mut groups = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::String(id) => groups.push(Value::Object(db.get_security_group(&id).await?)),
            other => groups.push(other),
        }
    }

    port.insert("security_groups".to_string(), Value::Array(groups));
    Ok(())
}

/// Per-(type, operation) outbound filtering.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// Apply [`uppercase_mac_address`] to ports on create.
    pub uppercase_mac: bool,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            uppercase_mac: true,
        }
    }
}

impl FilterPolicy {
    /// Filter a resource for the given operation. Deletes carry no body and
    /// leave the resource unchanged.
    pub async fn apply(
        &self,
        operation: Operation,
        ty: ResourceType,
        resource: &mut Resource,
        db: &dyn ResourceDb,
    ) -> Result<()> {
        match operation {
            Operation::Create => self.filter_create(ty, resource, db).await,
            Operation::Update => self.filter_update(ty, resource, db).await,
            Operation::Delete => Ok(()),
        }
    }

    pub async fn filter_create(
        &self,
        ty: ResourceType,
        resource: &mut Resource,
        db: &dyn ResourceDb,
    ) -> Result<()> {
        match ty {
            ResourceType::Network => drop_keys(resource, NETWORK_CREATE_DROP),
            ResourceType::Subnet => {}
            ResourceType::Port => {
                expand_security_groups(resource, db).await?;
                if self.uppercase_mac {
                    uppercase_mac_address(resource);
                }
                drop_keys(resource, PORT_CREATE_DROP);
            }
        }
        Ok(())
    }

    pub async fn filter_update(
        &self,
        ty: ResourceType,
        resource: &mut Resource,
        db: &dyn ResourceDb,
    ) -> Result<()> {
        match ty {
            ResourceType::Network => drop_keys(resource, NETWORK_UPDATE_DROP),
            ResourceType::Subnet => drop_keys(resource, SUBNET_UPDATE_DROP),
            ResourceType::Port => {
                expand_security_groups(resource, db).await?;
                drop_keys(resource, PORT_UPDATE_DROP);
            }
        }
        Ok(())
    }
}
