//! Full resync - re-push everything the controller is missing.
//!
//! Every database resource is probed with a GET on its object path. A 404
//! means the controller lacks it: the resource is create-filtered and queued.
//! Each type's queue goes out as one POST, ignoring 400 for objects that
//! appeared in the meantime. Types run in [`ResourceType::RESYNC_ORDER`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::SyncState;
use crate::client::{Controller, Method};
use crate::config::ProbeFailurePolicy;
use crate::db::ResourceDb;
use crate::error::{DriverError, Result};
use crate::filter::FilterPolicy;
use crate::resource::{resource_id, Resource, ResourceType};

/// Result of a [`FullResynchronizer::resync_all`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResyncOutcome {
    /// Mode was already in sync; nothing was sent.
    AlreadyInSync,
    /// Another resync holds the slot; nothing was sent.
    InFlight,
    /// A pass ran to completion and the mode is now in sync.
    Completed(ResyncReport),
}

/// Counters for one completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncReport {
    /// Existence probes sent.
    pub probed: usize,
    /// Resources pushed, per type.
    pub pushed: BTreeMap<ResourceType, usize>,
}

/// Request body for a batch: the singular key for one resource, the
/// collection key for several.
pub fn batch_envelope(ty: ResourceType, mut pending: Vec<Resource>) -> Value {
    if pending.len() == 1 {
        let resource = pending.pop().unwrap_or_default();
        json!({ ty.singular(): resource })
    } else {
        json!({ ty.collection(): pending })
    }
}

pub struct FullResynchronizer {
    controller: Arc<dyn Controller>,
    state: Arc<SyncState>,
    filter: FilterPolicy,
    probe_failure: ProbeFailurePolicy,
}

impl FullResynchronizer {
    pub fn new(
        controller: Arc<dyn Controller>,
        state: Arc<SyncState>,
        filter: FilterPolicy,
        probe_failure: ProbeFailurePolicy,
    ) -> Self {
        Self {
            controller,
            state,
            filter,
            probe_failure,
        }
    }

    /// Push the whole database to the controller.
    ///
    /// Only one pass runs at a time; a concurrent call returns
    /// [`ResyncOutcome::InFlight`] right away. On error the mode stays out of
    /// sync and the error is returned.
    pub async fn resync_all(&self, db: &dyn ResourceDb) -> Result<ResyncOutcome> {
        let Some(_permit) = self.state.try_begin_resync() else {
            debug!("Full resync already running, skipping");
            return Ok(ResyncOutcome::InFlight);
        };
        if !self.state.is_out_of_sync() {
            return Ok(ResyncOutcome::AlreadyInSync);
        }

        info!("Starting full resync");
        match self.run_pass(db).await {
            Ok(report) => {
                self.state.mark_in_sync();
                info!(probed = report.probed, pushed = ?report.pushed, "Full resync complete");
                Ok(ResyncOutcome::Completed(report))
            }
            Err(e) => {
                error!(error = %e, "Full resync failed");
                Err(self.state.fail(e))
            }
        }
    }

    async fn run_pass(&self, db: &dyn ResourceDb) -> Result<ResyncReport> {
        let mut report = ResyncReport::default();
        let mut deferred: Option<DriverError> = None;

        for ty in ResourceType::RESYNC_ORDER {
            let resources = db.list_all(ty).await?;
            report.probed += resources.len();

            let pending = self.collect_missing(ty, resources, db, &mut deferred).await?;
            if pending.is_empty() {
                debug!(resource = %ty, "Controller has every resource");
                continue;
            }

            let count = pending.len();
            self.push_batch(ty, pending).await?;
            report.pushed.insert(ty, count);
        }

        match deferred {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Probe each resource and return the create-filtered ones the
    /// controller does not have.
    async fn collect_missing(
        &self,
        ty: ResourceType,
        resources: Vec<Resource>,
        db: &dyn ResourceDb,
        deferred: &mut Option<DriverError>,
    ) -> Result<Vec<Resource>> {
        let mut pending = Vec::new();

        for mut resource in resources {
            let Some(id) = resource_id(&resource).map(str::to_owned) else {
                warn!(resource = %ty, "Skipping resource without id");
                continue;
            };

            match self
                .controller
                .send(Method::Get, &ty.object_path(&id), None, &[])
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_controller_not_found() => {
                    self.filter.filter_create(ty, &mut resource, db).await?;
                    pending.push(resource);
                }
                Err(e) => match self.probe_failure {
                    ProbeFailurePolicy::Abort => return Err(e),
                    ProbeFailurePolicy::Continue => {
                        warn!(resource = %ty, id = %id, error = %e, "Existence probe failed, skipping");
                        deferred.get_or_insert(e);
                    }
                },
            }
        }

        Ok(pending)
    }

    async fn push_batch(&self, ty: ResourceType, pending: Vec<Resource>) -> Result<()> {
        info!(resource = %ty, count = pending.len(), "Pushing missing resources");
        let body = batch_envelope(ty, pending);
        // 400 means the object already exists.
        self.controller
            .send(Method::Post, ty.collection(), Some(&body), &[400])
            .await
    }
}
