//! Job tracker errors

use super::state::JobStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    /// Attempted to move a job backwards or out of a terminal state
    #[error("Job {job_id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// The worker pool has been shut down
    #[error("Job queue is closed")]
    QueueClosed,

    /// The job did not reach a terminal state before the deadline
    #[error("Job {job_id} not finished after {waited_ms}ms (last status: {})", describe_status(.last_status))]
    WaitTimeout {
        job_id: String,
        waited_ms: u64,
        last_status: Option<JobStatus>,
    },
}

fn describe_status(status: &Option<JobStatus>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub type JobResult<T> = Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = JobError::InvalidTransition {
            job_id: "abc".to_string(),
            from: JobStatus::Done,
            to: JobStatus::Running,
        };
        assert_eq!(err.to_string(), "Job abc: invalid transition done -> running");

        let err = JobError::WaitTimeout {
            job_id: "abc".to_string(),
            waited_ms: 50,
            last_status: None,
        };
        assert!(err.to_string().ends_with("(last status: unknown)"));
    }
}
