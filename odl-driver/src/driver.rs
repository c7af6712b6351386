//! Sync driver - entry point for resource lifecycle events.
//!
//! While the controller is out of sync every event triggers a full resync;
//! once in sync, only the changed object is pushed. A failed push flips the
//! driver back to out of sync so the next event, whatever its type, catches
//! the controller up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::client::{Controller, RestClient};
use crate::config::{DriverOptions, OdlConfig};
use crate::db::ResourceDb;
use crate::error::{DriverError, Result};
use crate::reconciler::full::{FullResynchronizer, ResyncOutcome};
use crate::reconciler::single::{PushOutcome, SingleResourceSynchronizer};
use crate::reconciler::{SyncMode, SyncState};
use crate::resource::{resource_id, Operation, Resource, ResourceType};
use crate::segment::{PortBinding, Segment, SegmentSelector};

/// A resource lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub operation: Operation,
    pub resource: ResourceType,
    pub id: String,
}

impl SyncEvent {
    pub fn new(operation: Operation, resource: ResourceType, id: impl Into<String>) -> Self {
        Self {
            operation,
            resource,
            id: id.into(),
        }
    }

    /// Event for the committed state of a resource.
    pub fn from_current(
        operation: Operation,
        resource: ResourceType,
        current: &Resource,
    ) -> Result<Self> {
        let id = resource_id(current).ok_or(DriverError::MissingId(resource))?;
        Ok(Self::new(operation, resource, id))
    }
}

/// What a [`SyncDriver::synchronize`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Resync(ResyncOutcome),
    Push(PushOutcome),
}

/// Counters for one [`SyncDriver::replay`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub failed: usize,
    pub malformed: usize,
}

/// One driver instance: a controller connection and its sync state.
pub struct SyncDriver {
    state: Arc<SyncState>,
    full: FullResynchronizer,
    single: SingleResourceSynchronizer,
    selector: SegmentSelector,
}

impl SyncDriver {
    pub fn new(controller: Arc<dyn Controller>, options: DriverOptions) -> Self {
        let state = Arc::new(SyncState::new());
        Self {
            full: FullResynchronizer::new(
                Arc::clone(&controller),
                Arc::clone(&state),
                options.filter.clone(),
                options.probe_failure,
            ),
            single: SingleResourceSynchronizer::new(controller, Arc::clone(&state), options.filter),
            selector: SegmentSelector::new(),
            state,
        }
    }

    /// Driver talking to the controller over REST. Fails on missing
    /// connection options.
    pub fn connect(config: &OdlConfig, options: DriverOptions) -> Result<Self> {
        let client = RestClient::new(config)?;
        Ok(Self::new(Arc::new(client), options))
    }

    pub fn mode(&self) -> SyncMode {
        self.state.mode()
    }

    /// Bring the controller in line with one database change.
    ///
    /// Errors are returned after the sync mode has been updated.
    pub async fn synchronize(
        &self,
        operation: Operation,
        ty: ResourceType,
        id: &str,
        db: &dyn ResourceDb,
    ) -> Result<SyncOutcome> {
        if self.state.is_out_of_sync() {
            debug!(resource = %ty, id = %id, %operation, "Out of sync, running full resync");
            return self.full.resync_all(db).await.map(SyncOutcome::Resync);
        }
        self.single
            .push_one(operation, ty, id, db)
            .await
            .map(SyncOutcome::Push)
    }

    pub async fn handle(&self, event: &SyncEvent, db: &dyn ResourceDb) -> Result<SyncOutcome> {
        self.synchronize(event.operation, event.resource, &event.id, db)
            .await
    }

    /// Hook for a committed create/update/delete of `current`.
    pub async fn postcommit(
        &self,
        operation: Operation,
        ty: ResourceType,
        current: &Resource,
        db: &dyn ResourceDb,
    ) -> Result<SyncOutcome> {
        let event = SyncEvent::from_current(operation, ty, current)?;
        self.handle(&event, db).await
    }

    /// Run a JSON-lines event log in order.
    ///
    /// Lines that do not parse and events that fail are logged and skipped.
    /// A failed event leaves the driver out of sync, so a later event in the
    /// log catches the controller up.
    pub async fn replay(&self, events: &str, db: &dyn ResourceDb) -> ReplayReport {
        let mut report = ReplayReport::default();

        for (lineno, line) in events.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: SyncEvent = match serde_json::from_str(line) {
                Ok(event) => event,
                Err(e) => {
                    report.malformed += 1;
                    warn!(line = lineno + 1, error = %e, "Skipping malformed event");
                    continue;
                }
            };

            match self.handle(&event, db).await {
                Ok(outcome) => {
                    report.applied += 1;
                    info!(
                        line = lineno + 1,
                        resource = %event.resource,
                        id = %event.id,
                        operation = %event.operation,
                        mode = ?self.mode(),
                        "Event applied: {:?}",
                        outcome
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        line = lineno + 1,
                        resource = %event.resource,
                        id = %event.id,
                        operation = %event.operation,
                        error = %e,
                        "Event failed"
                    );
                }
            }
        }

        report
    }

    /// Run a full resync now. A no-op when already in sync.
    pub async fn resync(&self, db: &dyn ResourceDb) -> Result<ResyncOutcome> {
        self.full.resync_all(db).await
    }

    pub fn bind_port(
        &self,
        port_id: &str,
        network_id: &str,
        segments: &[Segment],
    ) -> Option<PortBinding> {
        self.selector.bind_port(port_id, network_id, segments)
    }
}
