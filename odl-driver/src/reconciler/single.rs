//! Single-object push for a controller that is in sync.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info};

use super::SyncState;
use crate::client::{Controller, Method};
use crate::db::ResourceDb;
use crate::error::Result;
use crate::filter::FilterPolicy;
use crate::resource::{Operation, ResourceType};

/// Result of a [`SingleResourceSynchronizer::push_one`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Created or updated on the controller.
    Pushed,
    /// Removed from the controller (or it was already gone).
    Deleted,
    /// The resource left the database before it could be pushed.
    Vanished,
}

pub struct SingleResourceSynchronizer {
    controller: Arc<dyn Controller>,
    state: Arc<SyncState>,
    filter: FilterPolicy,
}

impl SingleResourceSynchronizer {
    pub fn new(controller: Arc<dyn Controller>, state: Arc<SyncState>, filter: FilterPolicy) -> Self {
        Self {
            controller,
            state,
            filter,
        }
    }

    /// Push one changed resource.
    ///
    /// Create POSTs to the collection, update PUTs to the object path, both
    /// ignoring 400. Delete sends a DELETE ignoring 404 without reading the
    /// database: the row is already gone when a delete is committed, and a
    /// read would turn the event into a no-op that leaves the controller
    /// object behind. A failed request marks the driver out of sync before
    /// the error is returned.
    pub async fn push_one(
        &self,
        operation: Operation,
        ty: ResourceType,
        id: &str,
        db: &dyn ResourceDb,
    ) -> Result<PushOutcome> {
        let (method, path) = match operation {
            Operation::Create => (Method::Post, ty.collection().to_string()),
            Operation::Update => (Method::Put, ty.object_path(id)),
            Operation::Delete => return self.delete_one(ty, id).await,
        };

        let mut resource = match db.get_by_id(ty, id).await {
            Ok(resource) => resource,
            Err(e) if e.is_db_not_found() => {
                debug!(resource = %ty, id = %id, "Resource not found, nothing to push");
                return Ok(PushOutcome::Vanished);
            }
            Err(e) => return Err(e),
        };

        self.filter.apply(operation, ty, &mut resource, db).await?;
        let body = json!({ ty.singular(): resource });

        // 400 means the object already exists.
        if let Err(e) = self.controller.send(method, &path, Some(&body), &[400]).await {
            error!(resource = %ty, id = %id, %operation, error = %e, "Push to controller failed");
            return Err(self.state.fail(e));
        }
        info!(resource = %ty, id = %id, %operation, "Pushed to controller");
        Ok(PushOutcome::Pushed)
    }

    async fn delete_one(&self, ty: ResourceType, id: &str) -> Result<PushOutcome> {
        // 404 means the controller never had it or already dropped it.
        if let Err(e) = self
            .controller
            .send(Method::Delete, &ty.object_path(id), None, &[404])
            .await
        {
            error!(resource = %ty, id = %id, error = %e, "Delete on controller failed");
            return Err(self.state.fail(e));
        }
        info!(resource = %ty, id = %id, "Deleted from controller");
        Ok(PushOutcome::Deleted)
    }
}
