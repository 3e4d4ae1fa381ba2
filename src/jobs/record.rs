//! Persisted job state.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::error::{JobError, JobResult};
use super::state::JobStatus;
use crate::record::CanonicalRecord;

/// Opaque job handle: a random UUID in 32-character hex form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Job state as stored under `job:<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Identifier exactly as submitted
    pub identifier: String,
    /// Present only when `done`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CanonicalRecord>,
    /// Present only when `error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When the store will forget this record
    pub expires_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn queued(job_id: JobId, identifier: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            status: JobStatus::Queued,
            identifier: identifier.into(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            expires_at: now + to_chrono(ttl),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn mark_running(&mut self, ttl: Duration) -> JobResult<()> {
        self.transition(JobStatus::Running, ttl)
    }

    pub fn complete(&mut self, record: CanonicalRecord, ttl: Duration) -> JobResult<()> {
        self.transition(JobStatus::Done, ttl)?;
        self.result = Some(record);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>, ttl: Duration) -> JobResult<()> {
        self.transition(JobStatus::Error, ttl)?;
        self.error = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus, ttl: Duration) -> JobResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                job_id: self.job_id.to_string(),
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        self.status = next;
        self.updated_at = now;
        self.expires_at = now + to_chrono(ttl);
        Ok(())
    }
}

fn to_chrono(ttl: Duration) -> ChronoDuration {
    ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX)
}
