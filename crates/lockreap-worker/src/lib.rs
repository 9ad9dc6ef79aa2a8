//! Scheduled stale lock reclamation for LockReap.
//!
//! This crate provides:
//! - The reclamation run state machine (elect → scan → reclaim → report)
//! - Advisory leader election over the cluster membership table
//! - Collaborator trait seams for the storage scan and content access
//! - A cancellable throttle between per-record unlock operations
//! - Cron scheduler wiring for the unlock and heartbeat jobs

pub mod elector;
pub mod reclaim;
pub mod run;
pub mod scanner;
pub mod scheduler;
pub mod throttle;

pub use run::{ReclamationRun, RunConfig, RunReport, RunStatus};
pub use scheduler::UnlockScheduler;
