//! Content version entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One version-info row of a content record.
///
/// The working version is the editable copy of a piece of content; editing
/// it takes a lock (`locked_by` + `locked_on`) that is normally released by
/// the editor. Locks that outlive their holder are what the reclamation job
/// cleans up.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentVersion {
    /// Identifier shared by all versions of the same content.
    pub identifier: Uuid,
    /// Language of this version.
    pub language_id: i64,
    /// The working (editable) version inode.
    pub working_inode: Uuid,
    /// The published version inode, if any.
    pub live_inode: Option<Uuid>,
    /// The user who holds the edit lock (if locked).
    pub locked_by: Option<Uuid>,
    /// When the lock was acquired.
    pub locked_on: Option<DateTime<Utc>>,
    /// When this version row was last written.
    pub version_ts: DateTime<Utc>,
}

impl ContentVersion {
    /// Check if the working version is currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked_by.is_some()
    }

    /// How long the current lock has been held, if locked.
    pub fn lock_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_on.map(|at| now - at)
    }
}

/// Read-only projection of a stale-locked working version.
///
/// Produced by the scan query and consumed exactly once by the reclaim
/// step; never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StaleLock {
    /// The working version inode to unlock.
    pub working_inode: Uuid,
    /// Language of the locked version.
    pub language_id: i64,
    /// The user who held the lock.
    pub locked_by: Uuid,
    /// When the lock was acquired.
    pub locked_on: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(locked_on: Option<DateTime<Utc>>) -> ContentVersion {
        ContentVersion {
            identifier: Uuid::new_v4(),
            language_id: 1,
            working_inode: Uuid::new_v4(),
            live_inode: None,
            locked_by: locked_on.map(|_| Uuid::new_v4()),
            locked_on,
            version_ts: Utc::now(),
        }
    }

    #[test]
    fn test_is_locked() {
        assert!(version(Some(Utc::now())).is_locked());
        assert!(!version(None).is_locked());
    }

    #[test]
    fn test_lock_age() {
        let now = Utc::now();
        let v = version(Some(now - Duration::seconds(90)));
        assert_eq!(v.lock_age(now), Some(Duration::seconds(90)));
        assert_eq!(version(None).lock_age(now), None);
    }
}
