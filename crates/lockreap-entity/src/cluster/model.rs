//! Cluster node entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One node's membership row.
///
/// Nodes register at startup, refresh `last_heartbeat` on an interval, and
/// deregister on clean shutdown. Nodes that crash age out via the liveness
/// timeout instead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClusterNode {
    /// Unique node identifier.
    pub id: Uuid,
    /// Hostname reported by the node, for operators reading the table.
    pub hostname: String,
    /// When this node process started. Leader selection orders by this.
    pub started_at: DateTime<Utc>,
    /// When this node last refreshed its membership row.
    pub last_heartbeat: DateTime<Utc>,
}

impl ClusterNode {
    /// Check whether the node's heartbeat is recent enough to count it as
    /// a live member.
    pub fn is_live(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_heartbeat <= timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(heartbeat_age_seconds: i64) -> ClusterNode {
        let now = Utc::now();
        ClusterNode {
            id: Uuid::new_v4(),
            hostname: "node-a".to_string(),
            started_at: now - Duration::hours(1),
            last_heartbeat: now - Duration::seconds(heartbeat_age_seconds),
        }
    }

    #[test]
    fn test_is_live_within_timeout() {
        let now = Utc::now();
        assert!(node(10).is_live(now, Duration::seconds(60)));
    }

    #[test]
    fn test_is_live_past_timeout() {
        let now = Utc::now();
        assert!(!node(120).is_live(now, Duration::seconds(60)));
    }
}
