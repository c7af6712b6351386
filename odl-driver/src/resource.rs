//! Resource kinds mirrored to the controller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DriverError;

/// A resource as handed out by the database: a plain attribute mapping.
pub type Resource = Map<String, Value>;

/// Resource types kept in sync with the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Network,
    Subnet,
    Port,
}

impl ResourceType {
    /// Full resync order. Subnets reference networks, ports reference both.
    pub const RESYNC_ORDER: [ResourceType; 3] =
        [ResourceType::Network, ResourceType::Subnet, ResourceType::Port];

    /// Envelope key for a single object.
    pub fn singular(self) -> &'static str {
        match self {
            ResourceType::Network => "network",
            ResourceType::Subnet => "subnet",
            ResourceType::Port => "port",
        }
    }

    /// Collection path and envelope key for a batch.
    pub fn collection(self) -> &'static str {
        match self {
            ResourceType::Network => "networks",
            ResourceType::Subnet => "subnets",
            ResourceType::Port => "ports",
        }
    }

    /// Path of a single object on the controller.
    pub fn object_path(self, id: &str) -> String {
        format!("{}/{}", self.collection(), id)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for ResourceType {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "network" | "networks" => Ok(ResourceType::Network),
            "subnet" | "subnets" => Ok(ResourceType::Subnet),
            "port" | "ports" => Ok(ResourceType::Port),
            other => Err(DriverError::UnknownResourceType(other.to_string())),
        }
    }
}

/// Resource lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

impl FromStr for Operation {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(DriverError::UnknownOperation(other.to_string())),
        }
    }
}

/// The `id` attribute of a persisted resource.
pub fn resource_id(resource: &Resource) -> Option<&str> {
    resource.get("id").and_then(Value::as_str)
}
