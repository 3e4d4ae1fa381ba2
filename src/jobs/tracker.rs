//! # Job Tracker
//!
//! Asynchronous front of the lookup service. `enqueue` hands back an opaque
//! job id immediately; the dispatch service runs the lookup later and records
//! each status transition in the store under `job:<id>`. Submission never
//! waits on the worker pool: the backlog queues in memory and the pool size
//! alone bounds concurrent registry calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::{JobError, JobResult};
use super::record::{JobId, JobRecord};
use super::worker_pool::{persist, JobDispatchService};
use crate::cache::{keys, CacheProvider};
use crate::config::JobsConfig;
use crate::lookup::LookupService;
use crate::metrics;

#[derive(Debug)]
pub struct JobTracker {
    store: CacheProvider,
    job_ttl: Duration,
    sender: RwLock<Option<mpsc::UnboundedSender<JobRecord>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl JobTracker {
    /// Spawn the dispatch service and return a tracker feeding it
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        lookup: Arc<LookupService>,
        store: CacheProvider,
        config: &JobsConfig,
        job_ttl: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let service = JobDispatchService::new(
            receiver,
            lookup,
            store.clone(),
            config.max_workers,
            job_ttl,
        );
        let dispatcher = tokio::spawn(service.run());

        info!(
            max_workers = config.max_workers,
            job_ttl_seconds = job_ttl.as_secs(),
            store = store.provider_name(),
            "Job tracker started"
        );

        Self {
            store,
            job_ttl,
            sender: RwLock::new(Some(sender)),
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    pub async fn is_accepting(&self) -> bool {
        self.sender.read().await.is_some()
    }

    /// Accept an identifier for background lookup
    ///
    /// The identifier is not validated here; malformed input ends in `error`.
    /// Returns once the `queued` record is written, however busy the pool is.
    pub async fn enqueue(&self, identifier: &str) -> JobResult<JobId> {
        let sender = self
            .sender
            .read()
            .await
            .clone()
            .ok_or(JobError::QueueClosed)?;

        let job = JobRecord::queued(JobId::generate(), identifier, self.job_ttl);
        let job_id = job.job_id.clone();
        let key = keys::job_key(job_id.as_str());

        persist(&self.store, &key, &job, self.job_ttl).await;

        if sender.send(job).is_err() {
            if let Err(e) = self.store.delete(&key).await {
                debug!(job_id = %job_id, error = %e, "Could not remove orphaned job record");
            }
            return Err(JobError::QueueClosed);
        }

        metrics::record_job_transition("queued");
        debug!(job_id = %job_id, "Job queued");
        Ok(job_id)
    }

    /// Current state of a job; `None` when unknown or expired
    pub async fn get_status(&self, job_id: impl AsRef<str>) -> Option<JobRecord> {
        let job_id = job_id.as_ref();
        match self
            .store
            .get_json::<JobRecord>(&keys::job_key(job_id))
            .await
        {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id, error = %e, "Could not read job state");
                None
            }
        }
    }

    /// Poll until the job is `done` or `error`, or the deadline passes
    pub async fn wait_for_terminal(
        &self,
        job_id: impl AsRef<str>,
        poll_interval: Duration,
        deadline: Duration,
    ) -> JobResult<JobRecord> {
        let job_id = job_id.as_ref();
        let started = Instant::now();
        let mut last_status = None;

        loop {
            if let Some(job) = self.get_status(job_id).await {
                if job.is_terminal() {
                    return Ok(job);
                }
                last_status = Some(job.status);
            }

            let elapsed = started.elapsed();
            if elapsed >= deadline {
                return Err(JobError::WaitTimeout {
                    job_id: job_id.to_string(),
                    waited_ms: elapsed.as_millis() as u64,
                    last_status,
                });
            }

            tokio::time::sleep(poll_interval.min(deadline - elapsed)).await;
        }
    }

    /// Stop accepting jobs and wait for queued and running ones to finish
    pub async fn shutdown(&self) {
        let sender = self.sender.write().await.take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        info!("Job tracker shutting down, draining queue");

        if let Some(handle) = self.dispatcher.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Job dispatch service ended abnormally");
            }
        }

        info!("Job tracker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use crate::providers::ProviderChain;

    fn tracker(store: CacheProvider) -> JobTracker {
        let lookup = Arc::new(LookupService::new(
            store.clone(),
            ProviderChain::mock_only(),
            Duration::from_secs(60),
        ));
        JobTracker::start(lookup, store, &JobsConfig::default(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_enqueue_and_wait() {
        let tracker = tracker(CacheProvider::in_memory(100));

        let job_id = tracker.enqueue("12.345.678/0001-90").await.unwrap();
        let job = tracker
            .wait_for_terminal(&job_id, Duration::from_millis(10), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(job.job_id, job_id);
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.identifier, "12.345.678/0001-90");
        assert!(job.result.unwrap().source.is_mock());
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let tracker = tracker(CacheProvider::in_memory(100));
        assert!(tracker.get_status("does-not-exist").await.is_none());
    }

    #[tokio::test]
    async fn test_wait_times_out_on_unknown_job() {
        let tracker = tracker(CacheProvider::in_memory(100));
        let err = tracker
            .wait_for_terminal("missing", Duration::from_millis(5), Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::WaitTimeout {
                last_status: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_fails() {
        let tracker = tracker(CacheProvider::in_memory(100));
        let job_id = tracker.enqueue("12345678000190").await.unwrap();

        tracker.shutdown().await;
        assert!(!tracker.is_accepting().await);

        // drained before shutdown returned
        let job = tracker.get_status(&job_id).await.unwrap();
        assert!(job.is_terminal());

        assert_eq!(
            tracker.enqueue("12345678000190").await.unwrap_err(),
            JobError::QueueClosed
        );
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn test_stalled_store_does_not_hold_up_enqueue() {
        let tracker = tracker(CacheProvider::stalled(Duration::from_millis(20)));

        let job_id = tokio::time::timeout(
            Duration::from_secs(1),
            tracker.enqueue("12345678000190"),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(tracker.get_status(&job_id).await.is_none());
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn test_noop_store_has_no_job_state() {
        let tracker = tracker(CacheProvider::noop());
        let job_id = tracker.enqueue("12345678000190").await.unwrap();
        tracker.shutdown().await;
        assert!(tracker.get_status(&job_id).await.is_none());
    }
}
