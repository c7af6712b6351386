//! Port binding - picks the network segment a port is bound to.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// VIF type handed to the compute side for every binding.
pub const VIF_TYPE_OVS: &str = "ovs";

/// Segment encapsulation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Local,
    Flat,
    Vlan,
    Vxlan,
    Gre,
    #[serde(other)]
    Other,
}

/// One candidate segment offered for a binding decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub network_type: NetworkType,
    #[serde(default)]
    pub segmentation_id: Option<u32>,
    #[serde(default)]
    pub physical_network: Option<String>,
}

/// VIF capabilities reported with a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VifDetails {
    pub port_filter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortStatus {
    Active,
}

/// A successful binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortBinding {
    pub segment_id: String,
    pub segmentation_id: Option<u32>,
    pub vif_type: &'static str,
    pub vif_details: VifDetails,
    pub status: PortStatus,
}

/// Chooses the first segment the controller can handle.
pub struct SegmentSelector;

impl SegmentSelector {
    pub fn new() -> Self {
        Self
    }

    /// Whether the controller supports this segment's network type.
    pub fn check_segment(&self, segment: &Segment) -> bool {
        matches!(
            segment.network_type,
            NetworkType::Local | NetworkType::Gre | NetworkType::Vxlan | NetworkType::Vlan
        )
    }

    /// Bind a port to the first supported segment, in offer order.
    ///
    /// Returns `None` if no segment qualifies; the port stays unbound.
    pub fn bind_port(
        &self,
        port_id: &str,
        network_id: &str,
        segments: &[Segment],
    ) -> Option<PortBinding> {
        debug!(port = %port_id, network = %network_id, "Attempting to bind port");

        for segment in segments {
            if self.check_segment(segment) {
                debug!(segment = ?segment, "Bound using segment");
                return Some(PortBinding {
                    segment_id: segment.id.clone(),
                    segmentation_id: segment.segmentation_id,
                    vif_type: VIF_TYPE_OVS,
                    vif_details: VifDetails { port_filter: true },
                    status: PortStatus::Active,
                });
            }
            debug!(
                id = %segment.id,
                seg = ?segment.segmentation_id,
                physnet = ?segment.physical_network,
                nettype = ?segment.network_type,
                "Refusing to bind port to segment"
            );
        }
        None
    }
}

impl Default for SegmentSelector {
    fn default() -> Self {
        Self::new()
    }
}
