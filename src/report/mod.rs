// src/report/mod.rs

//! Status reporting to the controlling server.
//!
//! Every lifecycle transition is one call on a [`StatusReporter`]. Payloads
//! are idempotent, so resending the same status is always safe; a retry
//! policy can wrap [`StatusReporter::update_status`] without touching the
//! callers.
//!
//! Failure policy: a failed delivery of any non-failure status is returned
//! to the caller. Delivering `FAILED` goes through [`report_failure`], which
//! only logs a delivery error so it can never mask the failure being
//! reported.

use std::future::Future;

use tracing::{error, warn};

use crate::errors::Result;
use crate::types::JobStatus;

pub mod http;

pub use http::HttpReporter;

pub trait StatusReporter: Send + Sync {
    fn update_status(&self, status: &JobStatus) -> impl Future<Output = Result<()>> + Send;

    /// Signal that `task_pk` finished successfully.
    fn task_complete(&self, task_pk: i64) -> impl Future<Output = Result<()>> + Send;
}

/// Report `FAILED(reason)`, best effort.
pub async fn report_failure<R: StatusReporter>(reporter: &R, reason: impl Into<String>) {
    let status = JobStatus::Failed(reason.into());
    error!(status = %status, "job failed");

    if let Err(e) = reporter.update_status(&status).await {
        warn!(error = %e, "could not deliver FAILED status; the failure is only recorded locally");
    }
}
