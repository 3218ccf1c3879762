// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Lifecycle state of a job as seen by the controlling server.
///
/// Execution path: `Queued -> Running -> {Completed | Failed}`.
/// Submission path: `Queued` or `Failed` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed(String),
}

impl JobStatus {
    /// Status code understood by the server: everything but a failure is `OK`.
    pub fn code(&self) -> &'static str {
        match self {
            JobStatus::Failed(_) => "FAILED",
            _ => "OK",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Running => "Running",
            JobStatus::Completed => "Completed",
            JobStatus::Failed(reason) => reason,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failed(_))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed(reason) => write!(f, "FAILED({reason})"),
        }
    }
}

/// Shape of the data an input/output binding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    File,
    Directory,
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(InputKind::File),
            "directory" => Ok(InputKind::Directory),
            other => Err(format!(
                "invalid kind: {other} (expected \"file\" or \"directory\")"
            )),
        }
    }
}

/// Backend a binding is staged from or to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Plain filesystem copy.
    Local,
    /// iRODS zone reached through a backend session.
    Irods,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageKind::Local),
            "irods" => Ok(StorageKind::Irods),
            other => Err(format!(
                "invalid storage: {other} (expected \"local\" or \"irods\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_status_carries_reason_and_failed_code() {
        let status = JobStatus::Failed("boom".to_string());
        assert_eq!(status.code(), "FAILED");
        assert_eq!(status.message(), "boom");
        assert!(status.is_failure());
    }

    #[test]
    fn non_failure_statuses_report_ok() {
        for status in [JobStatus::Queued, JobStatus::Running, JobStatus::Completed] {
            assert_eq!(status.code(), "OK");
            assert!(!status.is_failure());
        }
        assert_eq!(JobStatus::Queued.message(), "Queued");
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Directory".parse::<InputKind>(), Ok(InputKind::Directory));
        assert!("folder".parse::<InputKind>().is_err());
        assert_eq!(" IRODS ".parse::<StorageKind>(), Ok(StorageKind::Irods));
    }
}
