//! Timed unlock job configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Configuration for the stale lock reclamation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockConfig {
    /// Cron expression for the job schedule. Required; there is no sensible
    /// default for how often an installation wants to reclaim locks.
    pub cron_expression: String,
    /// Age in seconds a lock must reach before it is considered stale.
    #[serde(default = "default_unlock_after_seconds")]
    pub unlock_after_seconds: u64,
    /// Maximum number of records fetched per scan page.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Delay in milliseconds between individual unlock operations.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Hard cap on the number of pages scanned in a single run. A safety
    /// valve: a run that exhausts the cap completes normally and leaves the
    /// remainder for the next tick.
    #[serde(default = "default_max_batches")]
    pub max_batches: u32,
}

impl UnlockConfig {
    /// Validate field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.cron_expression.trim().is_empty() {
            return Err(AppError::validation("unlock.cron_expression must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(AppError::validation("unlock.batch_size must be greater than zero"));
        }
        if self.max_batches == 0 {
            return Err(AppError::validation("unlock.max_batches must be greater than zero"));
        }
        Ok(())
    }
}

fn default_unlock_after_seconds() -> u64 {
    86_400
}

fn default_batch_size() -> u32 {
    1_000
}

fn default_throttle_ms() -> u64 {
    50
}

fn default_max_batches() -> u32 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg: UnlockConfig =
            serde_json::from_value(serde_json::json!({"cron_expression": "0 0 * * * *"}))
                .expect("should deserialize");
        assert_eq!(cfg.unlock_after_seconds, 86_400);
        assert_eq!(cfg.batch_size, 1_000);
        assert_eq!(cfg.throttle_ms, 50);
        assert_eq!(cfg.max_batches, 1_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let cfg: UnlockConfig = serde_json::from_value(serde_json::json!({
            "cron_expression": "0 0 * * * *",
            "batch_size": 0,
        }))
        .expect("should deserialize");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_empty_cron_rejected() {
        let cfg: UnlockConfig =
            serde_json::from_value(serde_json::json!({"cron_expression": " "}))
                .expect("should deserialize");
        assert!(cfg.validate().is_err());
    }
}
