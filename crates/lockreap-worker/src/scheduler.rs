//! Cron scheduler for the unlock and heartbeat jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;
use uuid::Uuid;

use lockreap_core::config::cluster::ClusterConfig;
use lockreap_core::config::unlock::UnlockConfig;
use lockreap_core::error::AppError;
use lockreap_database::repositories::ClusterRepository;

use crate::run::ReclamationRun;

/// Cron-based scheduler for the timed unlock job and the membership
/// heartbeat.
pub struct UnlockScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// The run fired on each unlock tick
    run: Arc<ReclamationRun>,
    /// Cluster repository for the heartbeat job
    cluster_repo: Arc<ClusterRepository>,
    /// This node's id
    node_id: Uuid,
    /// Cron expression for the unlock job
    cron_expression: String,
    /// Interval between membership heartbeats
    heartbeat_interval: Duration,
}

impl std::fmt::Debug for UnlockScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockScheduler").finish()
    }
}

impl UnlockScheduler {
    /// Create a new scheduler.
    pub async fn new(
        run: Arc<ReclamationRun>,
        cluster_repo: Arc<ClusterRepository>,
        node_id: Uuid,
        unlock_config: &UnlockConfig,
        cluster_config: &ClusterConfig,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            run,
            cluster_repo,
            node_id,
            cron_expression: unlock_config.cron_expression.clone(),
            heartbeat_interval: Duration::from_secs(cluster_config.heartbeat_interval_seconds),
        })
    }

    /// Register all scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_timed_unlock().await?;
        self.register_heartbeat().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Timed unlock — fires on the configured cron expression.
    ///
    /// Runs never overlap on one node: a tick that fires while a prior run
    /// is still active is skipped, and its work waits for the next tick.
    async fn register_timed_unlock(&self) -> Result<(), AppError> {
        let run = Arc::clone(&self.run);
        let active = Arc::new(Mutex::new(()));

        let job = CronJob::new_async(self.cron_expression.as_str(), move |_uuid, _lock| {
            let run = Arc::clone(&run);
            let active = Arc::clone(&active);
            Box::pin(async move {
                let Ok(_guard) = active.try_lock() else {
                    tracing::warn!("Previous unlock run still active, skipping this tick");
                    return;
                };
                run.execute().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Failed to create timed_unlock schedule '{}': {}",
                self.cron_expression, e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add timed_unlock schedule: {}", e))
        })?;

        tracing::info!(cron = %self.cron_expression, "Registered: timed_unlock");
        Ok(())
    }

    /// Membership heartbeat — refreshes this node's liveness row.
    async fn register_heartbeat(&self) -> Result<(), AppError> {
        let repo = Arc::clone(&self.cluster_repo);
        let node_id = self.node_id;

        let job = CronJob::new_repeated_async(self.heartbeat_interval, move |_uuid, _lock| {
            let repo = Arc::clone(&repo);
            Box::pin(async move {
                if let Err(e) = repo.heartbeat(node_id).await {
                    tracing::warn!(error = %e, "Failed to refresh membership heartbeat");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create heartbeat schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add heartbeat schedule: {}", e)))?;

        tracing::info!(
            interval_seconds = self.heartbeat_interval.as_secs(),
            "Registered: cluster_heartbeat"
        );
        Ok(())
    }
}
