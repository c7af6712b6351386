//! Router and floating IP forwarding.
//!
//! L3 changes go straight to the controller with no sync-mode tracking and
//! no ignored statuses; failures are the caller's to handle.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::client::{Controller, Method};
use crate::error::Result;
use crate::filter::drop_keys;
use crate::resource::Resource;

const ROUTERS: &str = "routers";
const FLOATINGIPS: &str = "floatingips";

const ROUTER_UPDATE_DROP: &[&str] = &["id", "tenant_id", "status"];

pub struct L3Forwarder {
    controller: Arc<dyn Controller>,
}

impl L3Forwarder {
    pub fn new(controller: Arc<dyn Controller>) -> Self {
        Self { controller }
    }

    pub async fn create_router(&self, router: &Resource) -> Result<()> {
        info!("Creating router on controller");
        self.controller
            .send(Method::Post, ROUTERS, Some(&json!({ "router": router })), &[])
            .await
    }

    pub async fn update_router(&self, id: &str, router: &Resource) -> Result<()> {
        info!(router = %id, "Updating router on controller");
        let mut filtered = router.clone();
        drop_keys(&mut filtered, ROUTER_UPDATE_DROP);
        self.controller
            .send(
                Method::Put,
                &format!("{}/{}", ROUTERS, id),
                Some(&json!({ "router": filtered })),
                &[],
            )
            .await
    }

    pub async fn delete_router(&self, id: &str) -> Result<()> {
        info!(router = %id, "Deleting router on controller");
        self.controller
            .send(Method::Delete, &format!("{}/{}", ROUTERS, id), None, &[])
            .await
    }

    pub async fn create_floatingip(&self, floatingip: &Resource) -> Result<()> {
        self.controller
            .send(
                Method::Post,
                FLOATINGIPS,
                Some(&json!({ "floatingip": floatingip })),
                &[],
            )
            .await
    }

    pub async fn update_floatingip(&self, id: &str, floatingip: &Resource) -> Result<()> {
        self.controller
            .send(
                Method::Put,
                &format!("{}/{}", FLOATINGIPS, id),
                Some(&json!({ "floatingip": floatingip })),
                &[],
            )
            .await
    }

    pub async fn delete_floatingip(&self, id: &str) -> Result<()> {
        self.controller
            .send(Method::Delete, &format!("{}/{}", FLOATINGIPS, id), None, &[])
            .await
    }
}
