// src/submit/bridge.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::JobConfig;
use crate::errors::{ClustersideError, Result};
use crate::exec::backend::{ProcessBackend, ProcessRequest};
use crate::exec::executor::failure_reason;
use crate::fs::FileSystem;
use crate::report::{StatusReporter, report_failure};
use crate::submit::template;
use crate::types::JobStatus;

/// What the scheduler made of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Exit 0 and nothing on stderr: `QUEUED` was reported.
    Queued { stdout: String },
    /// Exit 0 with stderr output: both `QUEUED` and `FAILED(stderr)` were
    /// reported.
    QueuedWithErrors { stdout: String, stderr: String },
    /// Non-zero exit: `FAILED` was reported.
    Rejected { code: Option<i32>, reason: String },
}

#[derive(Debug)]
pub struct SubmissionBridge<P, R> {
    backend: P,
    reporter: R,
    fs: Arc<dyn FileSystem>,
    scheduler: String,
    script_dir: PathBuf,
}

impl<P, R> SubmissionBridge<P, R>
where
    P: ProcessBackend,
    R: StatusReporter,
{
    pub fn new(backend: P, reporter: R, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            backend,
            reporter,
            fs,
            scheduler: "qsub".to_string(),
            script_dir: PathBuf::from("."),
        }
    }

    pub fn with_scheduler(mut self, scheduler: impl Into<String>) -> Self {
        self.scheduler = scheduler.into();
        self
    }

    /// Directory receiving the rendered `submit_<job_pk>` script.
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    pub fn script_path(&self, job_pk: i64) -> PathBuf {
        self.script_dir.join(format!("submit_{job_pk}"))
    }

    /// Render `template_path`, write the script and submit it once.
    ///
    /// Template problems are `ConfigError`s raised before the scheduler is
    /// touched. A scheduler that cannot be started at all is reported as
    /// `FAILED` and returned as [`ClustersideError::SchedulerUnavailable`].
    /// Everything else is reported and returned as a [`SubmitOutcome`].
    pub async fn submit(&self, cfg: &JobConfig, template_path: &Path) -> Result<SubmitOutcome> {
        let source = self.fs.read_to_string(template_path).map_err(|e| {
            ClustersideError::ConfigError(format!(
                "cannot read submission template {}: {e:#}",
                template_path.display()
            ))
        })?;
        let script = template::render(&source, cfg)?;

        let script_path = self.script_path(cfg.job_pk);
        self.fs
            .write(&script_path, script.as_bytes())
            .map_err(ClustersideError::Other)?;
        info!(job_pk = cfg.job_pk, path = %script_path.display(), "submission script written");

        let request =
            ProcessRequest::new(&self.scheduler).arg(script_path.to_string_lossy().into_owned());
        let output = match self.backend.run(request).await {
            Ok(output) => output,
            Err(e) => {
                let reason = e.to_string();
                report_failure(&self.reporter, reason.clone()).await;
                return Err(ClustersideError::SchedulerUnavailable(reason));
            }
        };

        if !output.success() {
            let reason = failure_reason(&self.scheduler, &output);
            warn!(job_pk = cfg.job_pk, program = %self.scheduler, exit_code = ?output.code, "submission rejected");
            report_failure(&self.reporter, reason.clone()).await;
            return Ok(SubmitOutcome::Rejected {
                code: output.code,
                reason,
            });
        }

        if let Err(e) = self.reporter.update_status(&JobStatus::Queued).await {
            warn!(job_pk = cfg.job_pk, error = %e, "could not report QUEUED");
        }
        if !output.stdout.is_empty() {
            println!("{}", output.stdout.trim_end());
        }

        if output.stderr.is_empty() {
            return Ok(SubmitOutcome::Queued {
                stdout: output.stdout,
            });
        }

        warn!(job_pk = cfg.job_pk, program = %self.scheduler, "scheduler accepted the job but wrote to stderr");
        report_failure(&self.reporter, output.stderr.clone()).await;
        Ok(SubmitOutcome::QueuedWithErrors {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
