//! One end-to-end reclamation invocation: elect → scan → reclaim → report.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing;
use uuid::Uuid;

use lockreap_core::config::unlock::UnlockConfig;
use lockreap_core::error::AppError;

use crate::elector::{ClusterMembership, LeaderElector};
use crate::reclaim::{ContentApi, ReclaimExecutor};
use crate::scanner::StaleLockScanner;
use crate::throttle::Throttle;

/// Immutable parameters for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Age a lock must reach before it is considered stale.
    pub unlock_after: Duration,
    /// Maximum records fetched per scan page. Must be greater than zero.
    pub batch_size: u32,
    /// Delay between individual unlock operations.
    pub throttle: Duration,
    /// Hard cap on the number of pages scanned in one run.
    pub max_batches: u32,
}

impl From<&UnlockConfig> for RunConfig {
    fn from(cfg: &UnlockConfig) -> Self {
        Self {
            unlock_after: Duration::from_secs(cfg.unlock_after_seconds),
            batch_size: cfg.batch_size,
            throttle: Duration::from_millis(cfg.throttle_ms),
            max_batches: cfg.max_batches,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The scan drained (or hit the batch cap) without a fatal error.
    Completed,
    /// Another node is the leader; no scan was performed.
    SkippedNotLeader,
    /// A scan error or cancellation stopped the run early.
    Aborted,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::SkippedNotLeader => write!(f, "skipped-not-leader"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Summary of one run. Mutated only by the owning run; immutable once the
/// run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Terminal state.
    pub status: RunStatus,
    /// Number of scan pages fetched, including the final empty one.
    pub batches_scanned: u32,
    /// Records whose lock was released.
    pub items_reclaimed: u64,
    /// Records whose release failed; never aborts the run.
    pub items_failed: u64,
}

impl RunReport {
    // Every exit path of `execute` overwrites the status.
    fn new() -> Self {
        Self {
            status: RunStatus::Aborted,
            batches_scanned: 0,
            items_reclaimed: 0,
            items_failed: 0,
        }
    }
}

/// Orchestration-level failure, inspected once by [`ReclamationRun`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The cluster membership query failed; the run fails closed.
    #[error("leader election failed: {0}")]
    Election(#[source] AppError),
    /// A scan page fetch failed; the run aborts at the page boundary.
    #[error("stale lock scan failed: {0}")]
    Scan(#[source] AppError),
    /// Release of a single record failed; tallied, never fatal.
    #[error("failed to release lock on {inode}: {source}")]
    Reclaim {
        /// The working inode whose release failed.
        inode: Uuid,
        /// The underlying failure.
        #[source]
        source: AppError,
    },
    /// Shutdown observed during a throttle pause.
    #[error("run cancelled by shutdown")]
    Cancelled,
}

/// Orchestrates one timed-unlock invocation.
///
/// All collaborators are injected at construction; the run owns no global
/// state. Record processing within a run is strictly sequential — the
/// throttle between records is the point, and concurrency would defeat it.
#[derive(Debug)]
pub struct ReclamationRun {
    scanner: Arc<dyn StaleLockScanner>,
    executor: ReclaimExecutor,
    elector: LeaderElector,
    throttle: Throttle,
    config: RunConfig,
}

impl ReclamationRun {
    /// Build a run from its collaborators and configuration.
    pub fn new(
        scanner: Arc<dyn StaleLockScanner>,
        content: Arc<dyn ContentApi>,
        membership: Arc<dyn ClusterMembership>,
        shutdown: watch::Receiver<bool>,
        config: RunConfig,
    ) -> Self {
        Self {
            scanner,
            executor: ReclaimExecutor::new(content),
            elector: LeaderElector::new(membership),
            throttle: Throttle::new(config.throttle, shutdown),
            config,
        }
    }

    /// Execute one run to a terminal state. Never fails the host: every
    /// failure class is recovered here and reflected in the report.
    pub async fn execute(&self) -> RunReport {
        // Fixed for the whole run: records locked after this point are
        // never reclaimed by this run, no matter how long it takes.
        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.unlock_after.as_secs() as i64);
        tracing::info!(cutoff = %cutoff, "Timed unlock: starting run");

        let mut report = RunReport::new();

        let elected = match self.elector.should_run().await {
            Ok(elected) => elected,
            Err(e) => {
                tracing::warn!(error = %e, "Leader election failed, failing closed");
                false
            }
        };
        if !elected {
            tracing::info!("Not the oldest live node in the cluster, skipping run");
            report.status = RunStatus::SkippedNotLeader;
            self.log_summary(&report);
            return report;
        }

        match self.scan_and_reclaim(cutoff, &mut report).await {
            Ok(()) => report.status = RunStatus::Completed,
            Err(RunError::Cancelled) => {
                tracing::info!("Run cancelled by shutdown, keeping partial tallies");
                report.status = RunStatus::Aborted;
            }
            Err(e) => {
                tracing::error!(error = %e, "Run aborted");
                report.status = RunStatus::Aborted;
            }
        }

        self.log_summary(&report);
        report
    }

    /// The scanning loop, bounded by `max_batches`.
    ///
    /// Cancellation is honored at page boundaries and throttle pauses only;
    /// a record's release always completes or fails cleanly first.
    async fn scan_and_reclaim(
        &self,
        cutoff: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<(), RunError> {
        for batch in 1..=self.config.max_batches {
            if self.throttle.is_cancelled() {
                return Err(RunError::Cancelled);
            }

            let page = self
                .scanner
                .next_page(cutoff, self.config.batch_size)
                .await
                .map_err(RunError::Scan)?;
            report.batches_scanned += 1;

            if page.is_empty() {
                return Ok(());
            }
            tracing::debug!(batch, records = page.len(), "Scanned stale lock page");

            for record in &page {
                if let Err(err) = self.executor.reclaim(record).await {
                    // Already logged with the inode by the executor.
                    tracing::trace!(error = %err, "Continuing past failed record");
                    report.items_failed += 1;
                } else {
                    report.items_reclaimed += 1;
                }
                self.throttle.pause().await?;
            }
        }

        // The cap is a safety valve, not an error.
        tracing::info!(
            max_batches = self.config.max_batches,
            "Batch cap reached, stale locks may remain until the next run"
        );
        Ok(())
    }

    fn log_summary(&self, report: &RunReport) {
        tracing::info!(
            status = %report.status,
            batches_scanned = report.batches_scanned,
            items_reclaimed = report.items_reclaimed,
            items_failed = report.items_failed,
            "Timed unlock: run finished"
        );
    }
}
