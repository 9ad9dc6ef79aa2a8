//! Cluster membership configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cluster membership configuration.
///
/// Every node registers a row in the `cluster_nodes` table and refreshes it
/// on a heartbeat. The oldest live node (earliest `started_at`) is the one
/// that runs scheduled reclamation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Stable node identifier. Generated at startup when not set, which is
    /// fine for deployments that do not care about identity across restarts.
    #[serde(default)]
    pub node_id: Option<Uuid>,
    /// Interval in seconds between membership heartbeats.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// A node whose last heartbeat is older than this is considered dead.
    #[serde(default = "default_liveness_timeout")]
    pub liveness_timeout_seconds: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            heartbeat_interval_seconds: default_heartbeat_interval(),
            liveness_timeout_seconds: default_liveness_timeout(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    15
}

fn default_liveness_timeout() -> u64 {
    60
}
