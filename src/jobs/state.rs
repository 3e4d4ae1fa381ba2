use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a background lookup job
///
/// `queued -> running -> {done | error}`; terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, waiting for a worker
    Queued,
    /// A worker is executing the lookup
    Running,
    /// Finished with a result
    Done,
    /// Finished with an error message
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running) | (Self::Running, Self::Done) | (Self::Running, Self::Error)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid job status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use JobStatus::*;

        assert!(Queued.can_transition_to(Running));
        assert!(Running.can_transition_to(Done));
        assert!(Running.can_transition_to(Error));

        assert!(!Queued.can_transition_to(Done));
        assert!(!Queued.can_transition_to(Error));
        assert!(!Running.can_transition_to(Queued));
        for terminal in [Done, Error] {
            assert!(terminal.is_terminal());
            for next in [Queued, Running, Done, Error] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_string_forms() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Done,
            JobStatus::Error,
        ] {
            assert_eq!(status.to_string().parse::<JobStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::json!(status.as_str())
            );
        }
        assert!("finished".parse::<JobStatus>().is_err());
    }
}
