//! # Job Dispatch Service
//!
//! Receives queued jobs from the tracker's channel and runs them with bounded
//! parallelism.
//!
//! ```text
//! enqueue → [mpsc] → [Semaphore (max_workers)] → LookupService::lookup
//!                                                     │
//!                            job:<id> ← running → done | error
//! ```
//!
//! A permit is acquired before the next job is taken off the channel, so
//! jobs start in submission order and a saturated pool leaves the backlog
//! waiting in the channel. Lookup panics are caught and recorded as job
//! errors.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use super::record::JobRecord;
use crate::cache::{keys, CacheProvider};
use crate::lookup::LookupService;
use crate::metrics;

pub struct JobDispatchService {
    receiver: mpsc::UnboundedReceiver<JobRecord>,
    lookup: Arc<LookupService>,
    store: CacheProvider,
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    job_ttl: Duration,
}

impl std::fmt::Debug for JobDispatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDispatchService")
            .field("max_workers", &self.max_workers)
            .field("available_workers", &self.semaphore.available_permits())
            .field("job_ttl", &self.job_ttl)
            .finish()
    }
}

impl JobDispatchService {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<JobRecord>,
        lookup: Arc<LookupService>,
        store: CacheProvider,
        max_workers: usize,
        job_ttl: Duration,
    ) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            receiver,
            lookup,
            store,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            job_ttl,
        }
    }

    /// Run until the channel is closed and every in-flight job has finished
    pub async fn run(mut self) {
        info!(
            max_workers = self.max_workers,
            "Job dispatch service starting"
        );

        loop {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("Worker semaphore closed, stopping dispatch");
                    break;
                }
            };

            let Some(job) = self.receiver.recv().await else {
                break;
            };

            debug!(job_id = %job.job_id, "Dispatching job");

            let lookup = self.lookup.clone();
            let store = self.store.clone();
            let job_ttl = self.job_ttl;

            tokio::spawn(async move {
                execute_job(&lookup, &store, job, job_ttl).await;
                drop(permit);
            });
        }

        // wait for in-flight jobs
        let all = u32::try_from(self.max_workers).unwrap_or(u32::MAX);
        if let Ok(permits) = self.semaphore.acquire_many(all).await {
            drop(permits);
        }

        info!("Job dispatch service stopped");
    }
}

/// Drive one job through `running` to a terminal state
///
/// Store writes are best effort: a failed write leaves the previous state
/// visible until it expires.
pub(crate) async fn execute_job(
    lookup: &LookupService,
    store: &CacheProvider,
    mut job: JobRecord,
    job_ttl: Duration,
) {
    let started = Instant::now();
    let key = keys::job_key(job.job_id.as_str());

    if let Err(e) = job.mark_running(job_ttl) {
        warn!(job_id = %job.job_id, error = %e, "Skipping job");
        return;
    }
    persist(store, &key, &job, job_ttl).await;
    metrics::record_job_transition(job.status.as_str());

    let outcome = AssertUnwindSafe(lookup.lookup(&job.identifier))
        .catch_unwind()
        .await;

    let transition = match outcome {
        Ok(Ok(record)) => job.complete(record, job_ttl),
        Ok(Err(e)) => job.fail(e.to_string(), job_ttl),
        Err(panic) => {
            let panic_msg = if let Some(s) = panic.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!(job_id = %job.job_id, panic_msg = %panic_msg, "Lookup panicked");
            job.fail(format!("Lookup panicked: {panic_msg}"), job_ttl)
        }
    };

    if let Err(e) = transition {
        warn!(job_id = %job.job_id, error = %e, "Job state not updated");
        return;
    }

    persist(store, &key, &job, job_ttl).await;
    metrics::record_job_transition(job.status.as_str());

    info!(
        job_id = %job.job_id,
        status = %job.status,
        error = job.error.as_deref().unwrap_or(""),
        duration_ms = started.elapsed().as_millis() as u64,
        "Job finished"
    );
}

pub(crate) async fn persist(store: &CacheProvider, key: &str, job: &JobRecord, ttl: Duration) {
    if let Err(e) = store.set_json(key, job, ttl).await {
        debug!(job_id = %job.job_id, status = %job.status, error = %e, "Job state write skipped");
    }
}
