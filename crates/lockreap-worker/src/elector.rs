//! Advisory leader election: the oldest live node runs the job.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing;
use uuid::Uuid;

use lockreap_core::config::cluster::ClusterConfig;
use lockreap_core::result::AppResult;
use lockreap_database::repositories::ClusterRepository;

use crate::run::RunError;

/// Read-only view of cluster membership — decouples the elector from the
/// membership table implementation.
#[async_trait]
pub trait ClusterMembership: Send + Sync + std::fmt::Debug {
    /// The id of the oldest live node, or `None` when the membership view
    /// is empty.
    async fn oldest_node_id(&self) -> AppResult<Option<Uuid>>;

    /// This node's own id.
    fn local_node_id(&self) -> Uuid;
}

/// Decides whether the local node is the one permitted to run.
///
/// This is advisory, not a distributed lock: membership views are assumed
/// to converge quickly, and a brief window of double execution during
/// membership churn is accepted rather than paying for consensus.
#[derive(Debug)]
pub struct LeaderElector {
    membership: Arc<dyn ClusterMembership>,
}

impl LeaderElector {
    /// Create an elector over the given membership view.
    pub fn new(membership: Arc<dyn ClusterMembership>) -> Self {
        Self { membership }
    }

    /// True only when the local node is exactly the oldest live node.
    ///
    /// A membership failure is returned as `RunError::Election` for the
    /// orchestrator to fail closed on: skipping a run beats risking
    /// duplicate concurrent reclamation across nodes.
    pub async fn should_run(&self) -> Result<bool, RunError> {
        let oldest = self
            .membership
            .oldest_node_id()
            .await
            .map_err(RunError::Election)?;

        let local = self.membership.local_node_id();
        match oldest {
            Some(id) => {
                tracing::debug!(oldest = %id, local = %local, "Leader check");
                Ok(id == local)
            }
            // Empty view: this node is not even registered yet. Fail closed.
            None => Ok(false),
        }
    }
}

/// Database-backed membership view over the `cluster_nodes` heartbeat table.
#[derive(Debug, Clone)]
pub struct HeartbeatMembership {
    repo: ClusterRepository,
    local_node_id: Uuid,
    liveness_timeout: Duration,
}

impl HeartbeatMembership {
    /// Create a membership view for the local node.
    pub fn new(repo: ClusterRepository, local_node_id: Uuid, config: &ClusterConfig) -> Self {
        Self {
            repo,
            local_node_id,
            liveness_timeout: Duration::seconds(config.liveness_timeout_seconds as i64),
        }
    }
}

#[async_trait]
impl ClusterMembership for HeartbeatMembership {
    async fn oldest_node_id(&self) -> AppResult<Option<Uuid>> {
        let liveness_cutoff = Utc::now() - self.liveness_timeout;
        self.repo.oldest_live_node(liveness_cutoff).await
    }

    fn local_node_id(&self) -> Uuid {
        self.local_node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockreap_core::error::AppError;

    #[derive(Debug)]
    struct FixedMembership {
        oldest: Option<Uuid>,
        local: Uuid,
        fail: bool,
    }

    #[async_trait]
    impl ClusterMembership for FixedMembership {
        async fn oldest_node_id(&self) -> AppResult<Option<Uuid>> {
            if self.fail {
                return Err(AppError::cluster("membership unreachable"));
            }
            Ok(self.oldest)
        }

        fn local_node_id(&self) -> Uuid {
            self.local
        }
    }

    #[tokio::test]
    async fn test_local_node_is_leader() {
        let local = Uuid::new_v4();
        let elector = LeaderElector::new(Arc::new(FixedMembership {
            oldest: Some(local),
            local,
            fail: false,
        }));
        assert!(elector.should_run().await.expect("should_run"));
    }

    #[tokio::test]
    async fn test_another_node_is_leader() {
        let elector = LeaderElector::new(Arc::new(FixedMembership {
            oldest: Some(Uuid::new_v4()),
            local: Uuid::new_v4(),
            fail: false,
        }));
        assert!(!elector.should_run().await.expect("should_run"));
    }

    #[tokio::test]
    async fn test_empty_view_fails_closed() {
        let elector = LeaderElector::new(Arc::new(FixedMembership {
            oldest: None,
            local: Uuid::new_v4(),
            fail: false,
        }));
        assert!(!elector.should_run().await.expect("should_run"));
    }

    #[tokio::test]
    async fn test_membership_error_propagates_as_election_error() {
        let elector = LeaderElector::new(Arc::new(FixedMembership {
            oldest: None,
            local: Uuid::new_v4(),
            fail: true,
        }));
        assert!(matches!(
            elector.should_run().await,
            Err(RunError::Election(_))
        ));
    }
}
