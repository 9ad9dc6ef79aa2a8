//! Content version repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use lockreap_core::error::{AppError, ErrorKind};
use lockreap_core::result::AppResult;
use lockreap_entity::content::{ContentVersion, StaleLock};

/// Repository for content version rows and their lock state.
#[derive(Debug, Clone)]
pub struct ContentVersionRepository {
    pool: PgPool,
}

impl ContentVersionRepository {
    /// Create a new content version repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one page of stale-locked working versions.
    ///
    /// Selects rows whose lock predates `cutoff` and whose holder is
    /// non-null, ordered by `working_inode` so that repeated pages neither
    /// skip nor duplicate records while earlier pages are being drained.
    pub async fn find_stale_locks(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<StaleLock>> {
        sqlx::query_as::<_, StaleLock>(
            "SELECT working_inode, language_id, locked_by, locked_on \
             FROM content_version_info \
             WHERE locked_on < $1 AND locked_by IS NOT NULL \
             ORDER BY working_inode ASC LIMIT $2",
        )
        .bind(cutoff)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to scan stale locks", e))
    }

    /// Find a version row by its working inode.
    pub async fn find_by_working_inode(&self, inode: Uuid) -> AppResult<Option<ContentVersion>> {
        sqlx::query_as::<_, ContentVersion>(
            "SELECT * FROM content_version_info WHERE working_inode = $1",
        )
        .bind(inode)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find content version", e)
        })
    }

    /// Clear the lock on a working version.
    ///
    /// Returns false when the row was already unlocked (or gone) by the time
    /// the update ran, which a reclamation racing an editor may observe.
    pub async fn clear_lock(&self, inode: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE content_version_info \
             SET locked_by = NULL, locked_on = NULL, version_ts = NOW() \
             WHERE working_inode = $1 AND locked_by IS NOT NULL",
        )
        .bind(inode)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clear content lock", e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}
