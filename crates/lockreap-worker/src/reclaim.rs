//! Per-record lock release with fault isolation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing;
use uuid::Uuid;

use lockreap_core::error::AppError;
use lockreap_core::result::AppResult;
use lockreap_database::repositories::ContentVersionRepository;
use lockreap_entity::content::{ContentVersion, StaleLock};

use crate::run::RunError;

/// Privileged content access — decouples the reclaim step from the content
/// store implementation.
///
/// Implementations run as the system principal: reclamation is a
/// maintenance task, so no user-level permission checks apply.
#[async_trait]
pub trait ContentApi: Send + Sync + std::fmt::Debug {
    /// Find the working version for an inode.
    async fn find_working(&self, inode: Uuid) -> AppResult<ContentVersion>;

    /// Release the lock on a working version.
    async fn unlock(&self, version: &ContentVersion) -> AppResult<()>;
}

#[async_trait]
impl ContentApi for ContentVersionRepository {
    async fn find_working(&self, inode: Uuid) -> AppResult<ContentVersion> {
        self.find_by_working_inode(inode)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No working version for inode {inode}")))
    }

    async fn unlock(&self, version: &ContentVersion) -> AppResult<()> {
        // An editor may have released (or re-taken and released) the lock
        // since the scan; clearing an already-clear lock is not an error.
        self.clear_lock(version.working_inode).await?;
        Ok(())
    }
}

/// Attempts release of one record, isolating its failure.
#[derive(Debug)]
pub struct ReclaimExecutor {
    content: Arc<dyn ContentApi>,
}

impl ReclaimExecutor {
    /// Create an executor over the given content access.
    pub fn new(content: Arc<dyn ContentApi>) -> Self {
        Self { content }
    }

    /// Release one stale lock.
    ///
    /// Any error — not found, conflict, transient backend failure — is
    /// caught at this single-record granularity, logged with the record's
    /// inode, and returned for the caller to tally. It never aborts the
    /// batch.
    pub async fn reclaim(&self, record: &StaleLock) -> Result<(), RunError> {
        let result = async {
            let version = self.content.find_working(record.working_inode).await?;
            self.content.unlock(&version).await
        }
        .await;

        match result {
            Ok(()) => {
                tracing::debug!(
                    inode = %record.working_inode,
                    locked_by = %record.locked_by,
                    locked_on = %record.locked_on,
                    "Stale lock released"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    inode = %record.working_inode,
                    error = %e,
                    "Failed to release stale lock"
                );
                Err(RunError::Reclaim {
                    inode: record.working_inode,
                    source: e,
                })
            }
        }
    }
}
