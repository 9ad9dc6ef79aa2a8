//! Paginated scan of stale-locked working versions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lockreap_core::result::AppResult;
use lockreap_database::repositories::ContentVersionRepository;
use lockreap_entity::content::StaleLock;

/// One bounded page of stale locks per call — decouples the run from the
/// storage backend.
///
/// Implementations must select records whose lock timestamp is strictly
/// earlier than `cutoff` and whose holder is non-null, in a deterministic
/// order, so that repeated pages neither skip nor duplicate records while
/// earlier pages are being drained. An empty page means nothing stale
/// remains at call time.
#[async_trait]
pub trait StaleLockScanner: Send + Sync + std::fmt::Debug {
    /// Fetch up to `batch_size` stale locks older than `cutoff`.
    async fn next_page(
        &self,
        cutoff: DateTime<Utc>,
        batch_size: u32,
    ) -> AppResult<Vec<StaleLock>>;
}

#[async_trait]
impl StaleLockScanner for ContentVersionRepository {
    async fn next_page(
        &self,
        cutoff: DateTime<Utc>,
        batch_size: u32,
    ) -> AppResult<Vec<StaleLock>> {
        self.find_stale_locks(cutoff, batch_size).await
    }
}
