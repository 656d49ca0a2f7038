//! Background Jobs Module
//!
//! Jobs registered with the job scheduler service. Each job is safe to re-run and logs
//! its own failures.
//!
//! # Available Jobs
//!
//! - `remote_sync_job` - Re-syncs the logged-in user's positions, watchlist and alerts

pub mod remote_sync_job;
