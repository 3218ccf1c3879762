use std::mem::discriminant;
use std::sync::{Arc, Mutex};

use clusterside::errors::{ClustersideError, Result};
use clusterside::report::StatusReporter;
use clusterside::types::JobStatus;

/// One call observed by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Status(JobStatus),
    TaskComplete(i64),
}

#[derive(Debug, Default)]
struct State {
    events: Vec<ReportEvent>,
    fail_on: Vec<JobStatus>,
}

/// A reporter that records every call, in order.
///
/// Calls that are told to fail are still recorded, so tests can assert
/// that a delivery was attempted.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    state: Arc<Mutex<State>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every delivery of a status of the same kind as `status`
    /// (the `FAILED` reason is ignored).
    pub fn fail_on(&self, status: JobStatus) {
        self.state.lock().unwrap().fail_on.push(status);
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Status(status) => Some(status),
                ReportEvent::TaskComplete(_) => None,
            })
            .collect()
    }

    pub fn task_completions(&self) -> Vec<i64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::TaskComplete(pk) => Some(pk),
                ReportEvent::Status(_) => None,
            })
            .collect()
    }
}

impl StatusReporter for RecordingReporter {
    async fn update_status(&self, status: &JobStatus) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(ReportEvent::Status(status.clone()));

        if state
            .fail_on
            .iter()
            .any(|s| discriminant(s) == discriminant(status))
        {
            return Err(ClustersideError::Report(format!("refusing {status}")));
        }
        Ok(())
    }

    async fn task_complete(&self, task_pk: i64) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(ReportEvent::TaskComplete(task_pk));
        Ok(())
    }
}
