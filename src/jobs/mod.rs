//! # Background Lookup Jobs
//!
//! `enqueue` returns a job id at once; a bounded worker pool runs the lookup
//! and writes `queued -> running -> done | error` into the store, where
//! `get_status` reads it back.

pub mod error;
pub mod record;
pub mod state;
pub mod tracker;
pub mod worker_pool;

pub use error::{JobError, JobResult};
pub use record::{JobId, JobRecord};
pub use state::JobStatus;
pub use tracker::JobTracker;
pub use worker_pool::JobDispatchService;
