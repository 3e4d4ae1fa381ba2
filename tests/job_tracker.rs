//! Background job lifecycle through the public tracker API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use verigov_lookup::config::JobsConfig;
use verigov_lookup::providers::ProviderChain;
use verigov_lookup::{CacheProvider, JobRecord, JobStatus, JobTracker, LookupService};

const JOB_TTL: Duration = Duration::from_secs(60);
const POLL: Duration = Duration::from_millis(10);
const DEADLINE: Duration = Duration::from_secs(5);

fn jobs(max_workers: usize) -> JobsConfig {
    JobsConfig { max_workers }
}

async fn wait_for_status(tracker: &JobTracker, job_id: &str, status: JobStatus) -> JobRecord {
    let started = std::time::Instant::now();
    loop {
        if let Some(job) = tracker.get_status(job_id).await {
            if job.status == status {
                return job;
            }
        }
        assert!(started.elapsed() < DEADLINE, "job {job_id} never reached {status}");
        tokio::time::sleep(POLL).await;
    }
}

#[tokio::test]
async fn enqueue_returns_before_the_lookup_runs() {
    let provider = GatedProvider::new();
    let store = CacheProvider::in_memory(1_000);
    let service = service_with(provider.clone(), store.clone(), false);
    let tracker = JobTracker::start(service, store, &jobs(2), JOB_TTL);

    let job_id = tracker.enqueue("12.345.678/0001-90").await.unwrap();
    assert_eq!(job_id.as_str().len(), 32);

    let running = wait_for_status(&tracker, job_id.as_str(), JobStatus::Running).await;
    assert!(running.result.is_none());
    assert!(running.error.is_none());
    assert_eq!(running.identifier, "12.345.678/0001-90");

    provider.release(1);
    let done = tracker
        .wait_for_terminal(&job_id, POLL, DEADLINE)
        .await
        .unwrap();

    assert_eq!(done.status, JobStatus::Done);
    assert_eq!(done.created_at, running.created_at);
    assert!(done.updated_at >= running.updated_at);
    let record = done.result.unwrap();
    assert_eq!(record.identifier, "12345678000190");
    assert_eq!(record.source.as_str(), "gated");

    tracker.shutdown().await;
}

#[tokio::test]
async fn worker_pool_bounds_concurrency_and_starts_in_order() {
    let provider = GatedProvider::new();
    let store = CacheProvider::in_memory(1_000);
    let service = service_with(provider.clone(), store.clone(), false);
    let tracker = JobTracker::start(service, store, &jobs(1), JOB_TTL);

    let identifiers = ["11111111000111", "22222222000122", "33333333000133"];
    let mut job_ids = Vec::new();
    for identifier in identifiers {
        job_ids.push(tracker.enqueue(identifier).await.unwrap());
    }

    wait_for_status(&tracker, job_ids[0].as_str(), JobStatus::Running).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    for job_id in &job_ids[1..] {
        let job = tracker.get_status(job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
    }

    provider.release(identifiers.len());
    for job_id in &job_ids {
        let job = tracker.wait_for_terminal(job_id, POLL, DEADLINE).await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
    }

    assert_eq!(provider.max_in_flight(), 1);
    assert_eq!(provider.started(), identifiers);

    tracker.shutdown().await;
}

#[tokio::test]
async fn enqueue_never_waits_on_a_busy_pool() {
    let provider = GatedProvider::new();
    let store = CacheProvider::in_memory(1_000);
    let service = service_with(provider.clone(), store.clone(), false);
    let tracker = JobTracker::start(service, store, &jobs(1), JOB_TTL);

    let first = tracker.enqueue("11111111000111").await.unwrap();
    wait_for_status(&tracker, first.as_str(), JobStatus::Running).await;

    // the only worker is stuck; every submission still returns at once
    let backlog = tokio::time::timeout(Duration::from_millis(500), async {
        let mut job_ids = Vec::new();
        for n in 0..100u64 {
            job_ids.push(tracker.enqueue(&format!("{n:014}")).await.unwrap());
        }
        job_ids
    })
    .await
    .expect("enqueue waited on the worker pool");

    for job_id in &backlog {
        let job = tracker.get_status(job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
    }

    provider.release(backlog.len() + 1);
    for job_id in backlog.iter().chain(std::iter::once(&first)) {
        let job = tracker.wait_for_terminal(job_id, POLL, DEADLINE).await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
    }
    assert_eq!(provider.max_in_flight(), 1);

    tracker.shutdown().await;
}

#[tokio::test]
async fn finished_job_reads_back_unchanged_under_lookup_load() {
    // small capacity so lookup traffic competes for space
    let store = CacheProvider::in_memory(10);
    let service = Arc::new(LookupService::new(
        store.clone(),
        ProviderChain::mock_only(),
        LOOKUP_TTL,
    ));
    let tracker = JobTracker::start(service.clone(), store, &jobs(2), Duration::from_secs(3600));

    let job_id = tracker.enqueue("12.345.678/0001-90").await.unwrap();
    let finished = tracker.wait_for_terminal(&job_id, POLL, DEADLINE).await.unwrap();
    assert_eq!(finished.status, JobStatus::Done);

    for round in 0..10 {
        for n in 0..50u64 {
            service.lookup(&format!("{n:014}")).await.unwrap();
        }
        let read = tracker.get_status(&job_id).await;
        assert_eq!(read.as_ref(), Some(&finished), "round {round}");
    }

    for _ in 0..5 {
        assert_eq!(tracker.get_status(&job_id).await, Some(finished.clone()));
    }

    tracker.shutdown().await;
}

#[tokio::test]
async fn invalid_identifier_ends_in_error() {
    let store = CacheProvider::in_memory(1_000);
    let service = Arc::new(LookupService::new(
        store.clone(),
        ProviderChain::mock_only(),
        LOOKUP_TTL,
    ));
    let tracker = JobTracker::start(service, store, &jobs(2), JOB_TTL);

    let job_id = tracker.enqueue("not-a-cnpj").await.unwrap();
    let job = tracker.wait_for_terminal(&job_id, POLL, DEADLINE).await.unwrap();

    assert_eq!(job.status, JobStatus::Error);
    assert!(job.result.is_none());
    assert!(job.error.unwrap().contains("Invalid identifier"));

    tracker.shutdown().await;
}

#[tokio::test]
async fn upstream_outage_ends_in_error_when_mock_is_disallowed() {
    let registry = FakeRegistry::start(Behavior::Status(503)).await;
    let service = Arc::new(http_service(vec![registry.provider_config("primary", 500)], false));
    let store = service.cache().clone();
    let tracker = JobTracker::start(service, store, &jobs(2), JOB_TTL);

    let job_id = tracker.enqueue("12345678000190").await.unwrap();
    let job = tracker.wait_for_terminal(&job_id, POLL, DEADLINE).await.unwrap();

    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error.unwrap().contains("unavailable"));

    tracker.shutdown().await;
}

#[tokio::test]
async fn jobs_and_sync_lookups_share_the_store() {
    let registry = FakeRegistry::start(Behavior::Publica).await;
    let service = Arc::new(http_service(vec![registry.provider_config("primary", 1_000)], false));
    let store = service.cache().clone();
    let tracker = JobTracker::start(service.clone(), store, &jobs(2), JOB_TTL);

    let record = service.lookup("12345678000190").await.unwrap();
    let job_id = tracker.enqueue("12.345.678/0001-90").await.unwrap();
    let job = tracker.wait_for_terminal(&job_id, POLL, DEADLINE).await.unwrap();

    assert_eq!(job.result, Some(record));
    assert_eq!(registry.hits(), 1);

    tracker.shutdown().await;
}

#[tokio::test]
async fn job_state_expires_with_its_ttl() {
    let store = CacheProvider::in_memory(1_000);
    let service = Arc::new(LookupService::new(
        store.clone(),
        ProviderChain::mock_only(),
        LOOKUP_TTL,
    ));
    let tracker = JobTracker::start(service, store, &jobs(1), Duration::from_millis(200));

    let job_id = tracker.enqueue("12345678000190").await.unwrap();
    let job = tracker.wait_for_terminal(&job_id, POLL, DEADLINE).await.unwrap();
    assert_eq!(job.expires_at - job.updated_at, chrono::Duration::milliseconds(200));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(tracker.get_status(&job_id).await.is_none());

    tracker.shutdown().await;
}

#[tokio::test]
async fn unknown_job_is_absent() {
    let store = CacheProvider::in_memory(10);
    let service = Arc::new(LookupService::new(
        store.clone(),
        ProviderChain::mock_only(),
        LOOKUP_TTL,
    ));
    let tracker = JobTracker::start(service, store, &jobs(1), JOB_TTL);

    assert!(tracker.get_status("0123456789abcdef0123456789abcdef").await.is_none());
    tracker.shutdown().await;
}
