//! Reconcilers pushing database state to the controller.
//!
//! [`full::FullResynchronizer`] re-pushes everything the controller is
//! missing, [`single::SingleResourceSynchronizer`] pushes one changed object.
//! Both share one [`SyncState`] per driver instance.

pub mod full;
pub mod single;

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::DriverError;

/// Whether the controller can be trusted to mirror the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    InSync,
    OutOfSync,
}

/// Held for the duration of a full resync.
pub type ResyncPermit<'a> = MutexGuard<'a, ()>;

/// Sync mode flag plus the single-full-resync guard.
///
/// Starts out of sync. Only a completed full resync marks it in sync; any
/// failed push marks it out of sync again.
pub struct SyncState {
    out_of_sync: AtomicBool,
    resync: Mutex<()>,
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            out_of_sync: AtomicBool::new(true),
            resync: Mutex::new(()),
        }
    }

    pub fn mode(&self) -> SyncMode {
        if self.is_out_of_sync() {
            SyncMode::OutOfSync
        } else {
            SyncMode::InSync
        }
    }

    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync.load(Ordering::SeqCst)
    }

    pub fn mark_in_sync(&self) {
        if self.out_of_sync.swap(false, Ordering::SeqCst) {
            info!(target: "audit", "Controller in sync");
        }
    }

    pub fn mark_out_of_sync(&self) {
        if !self.out_of_sync.swap(true, Ordering::SeqCst) {
            warn!(target: "audit", "Controller out of sync, next event triggers a full resync");
        }
    }

    /// Recovery step for a failed push: mark out of sync, hand the error back.
    pub fn fail(&self, err: DriverError) -> DriverError {
        self.mark_out_of_sync();
        err
    }

    /// Claim the full resync slot without waiting.
    ///
    /// `None` means another resync is running.
    pub fn try_begin_resync(&self) -> Option<ResyncPermit<'_>> {
        self.resync.try_lock().ok()
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}
