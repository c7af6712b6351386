//! Driver error types.

use thiserror::Error;

use crate::client::Method;
use crate::resource::ResourceType;

/// Errors that can occur while talking to the controller or the database.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Controller answered with an error status that was not ignored.
    #[error("{method} {path} failed with status {status}")]
    Transport {
        method: Method,
        path: String,
        status: u16,
    },

    /// Request never produced a status (connect failure, timeout).
    #[error("controller request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Database lookup miss.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Required connection option is missing.
    #[error("missing required option odl_rest.{0}")]
    Config(&'static str),

    /// Lifecycle event for a resource without an id.
    #[error("{0} has no id")]
    MissingId(ResourceType),

    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// HTTP status carried by a controller error.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriverError::Transport { status, .. } => Some(*status),
            DriverError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Controller reported the object as absent.
    pub fn is_controller_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Database reported the object as absent.
    pub fn is_db_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound { .. })
    }
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
