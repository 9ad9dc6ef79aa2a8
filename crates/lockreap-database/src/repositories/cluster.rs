//! Cluster membership repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use lockreap_core::error::{AppError, ErrorKind};
use lockreap_core::result::AppResult;
use lockreap_entity::cluster::ClusterNode;

/// Repository for the `cluster_nodes` membership table.
#[derive(Debug, Clone)]
pub struct ClusterRepository {
    pool: PgPool,
}

impl ClusterRepository {
    /// Create a new cluster repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register this node, or refresh its row if the id already exists.
    ///
    /// `started_at` is preserved on conflict: a heartbeat-driven re-register
    /// must not make the node look younger than it is.
    pub async fn register(&self, node: &ClusterNode) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO cluster_nodes (id, hostname, started_at, last_heartbeat) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET hostname = $2, last_heartbeat = $4",
        )
        .bind(node.id)
        .bind(&node.hostname)
        .bind(node.started_at)
        .bind(node.last_heartbeat)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Cluster, "Failed to register node", e))?;

        info!(node_id = %node.id, hostname = %node.hostname, "Cluster node registered");
        Ok(())
    }

    /// Refresh this node's heartbeat timestamp.
    pub async fn heartbeat(&self, node_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE cluster_nodes SET last_heartbeat = NOW() WHERE id = $1")
            .bind(node_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Cluster, "Failed to update heartbeat", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::new(
                ErrorKind::Cluster,
                format!("Node {node_id} is not registered"),
            ));
        }
        Ok(())
    }

    /// Remove this node's membership row on clean shutdown.
    pub async fn deregister(&self, node_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM cluster_nodes WHERE id = $1")
            .bind(node_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Cluster, "Failed to deregister node", e))?;

        info!(node_id = %node_id, "Cluster node deregistered");
        Ok(())
    }

    /// Return the id of the oldest live node.
    ///
    /// Live means a heartbeat newer than `liveness_cutoff`. Ties on
    /// `started_at` break on id, so every node resolves the same winner.
    pub async fn oldest_live_node(
        &self,
        liveness_cutoff: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM cluster_nodes WHERE last_heartbeat >= $1 \
             ORDER BY started_at ASC, id ASC LIMIT 1",
        )
        .bind(liveness_cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Cluster, "Failed to query oldest live node", e)
        })
    }
}
