//! odl-driver: keeps an OpenDaylight controller in sync with the network
//! resource database.
//!
//! The database is the source of truth. Lifecycle events for networks,
//! subnets and ports go through [`SyncDriver::synchronize`], which either
//! pushes the changed object or, after any failure, re-pushes everything the
//! controller is missing.
//!
//! # Example
//! ```ignore
//! use odl_driver::{DriverOptions, MemoryDb, OdlConfig, Operation, ResourceType, SyncDriver};
//!
//! let config = OdlConfig::new("http://odl:8080/controller/nb/v2/neutron", "admin", "admin");
//! let driver = SyncDriver::connect(&config, DriverOptions::default())?;
//! let db = MemoryDb::load("snapshot.json").await?;
//! driver.synchronize(Operation::Create, ResourceType::Network, "net-1", &db).await?;
//! ```

pub mod client;
pub mod config;
pub mod db;
pub mod driver;
pub mod error;
pub mod filter;
pub mod l3;
pub mod reconciler;
pub mod resource;
pub mod segment;

#[cfg(test)]
mod test_util;

pub use client::{Controller, Method, RestClient};
pub use config::{DriverOptions, OdlConfig, ProbeFailurePolicy};
pub use db::{MemoryDb, ResourceDb, Snapshot};
pub use driver::{ReplayReport, SyncDriver, SyncEvent, SyncOutcome};
pub use error::{DriverError, Result};
pub use filter::FilterPolicy;
pub use l3::L3Forwarder;
pub use reconciler::full::{ResyncOutcome, ResyncReport};
pub use reconciler::single::PushOutcome;
pub use reconciler::SyncMode;
pub use resource::{Operation, Resource, ResourceType};
pub use segment::{PortBinding, Segment, SegmentSelector};
