// src/exec/executor.rs

//! The execution path: stage input, run the container, report the outcome.
//!
//! [`Executor::execute`] never returns an error. Every failure is turned
//! into a `FAILED` status report (through [`report_failure`]) and a
//! [`RunOutcome`] the caller can log; the process exit code stays 0.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::errors::{ClustersideError, Result};
use crate::exec::backend::{ProcessBackend, ProcessOutput};
use crate::exec::container::ContainerRuntime;
use crate::fs::FileSystem;
use crate::job::Run;
use crate::report::{StatusReporter, report_failure};
use crate::store::{SessionConnector, Store};
use crate::types::JobStatus;

/// How a run ended, from the executor's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Container exited 0, outputs (if any) uploaded, `COMPLETED` delivered.
    Completed,
    /// Input could not be staged; the container was never started.
    StagingFailed(String),
    /// `RUNNING` could not be delivered; the container was never started.
    ReportingFailed(String),
    /// The container runtime binary could not be started.
    InvocationFailed(String),
    /// The container ran and exited non-zero (`None` when killed by a signal).
    ContainerFailed { code: Option<i32> },
    /// The container succeeded but the output upload did not.
    OutputFailed(String),
}

#[derive(Debug)]
pub struct Executor<P, R, C> {
    backend: P,
    reporter: R,
    connector: C,
    fs: Arc<dyn FileSystem>,
    runtime: ContainerRuntime,
    output_dir: PathBuf,
}

impl<P, R, C> Executor<P, R, C>
where
    P: ProcessBackend,
    R: StatusReporter,
    C: SessionConnector + Clone,
{
    pub fn new(backend: P, reporter: R, connector: C, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            backend,
            reporter,
            connector,
            fs,
            runtime: ContainerRuntime::default(),
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_runtime(mut self, runtime: ContainerRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Directory receiving `<id>.stdout` / `<id>.stderr`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub async fn execute(&self, run: &Run) -> RunOutcome {
        info!(job_pk = run.job_pk(), task_pk = ?run.task_pk(), image = %run.image(), "starting run");

        let input = match self.stage_input(run).await {
            Ok(path) => path,
            Err(e) => {
                let reason = e.to_string();
                report_failure(&self.reporter, reason.clone()).await;
                return RunOutcome::StagingFailed(reason);
            }
        };

        if let Err(e) = self.reporter.update_status(&JobStatus::Running).await {
            error!(job_pk = run.job_pk(), error = %e, "could not report RUNNING; aborting run");
            let reason = e.to_string();
            report_failure(&self.reporter, reason.clone()).await;
            return RunOutcome::ReportingFailed(reason);
        }

        let request = self.runtime.request(run, run.workdir(), input.as_deref());
        let output = match self.backend.run(request).await {
            Ok(output) => output,
            Err(e) => {
                let reason = e.to_string();
                report_failure(&self.reporter, reason.clone()).await;
                return RunOutcome::InvocationFailed(reason);
            }
        };

        self.persist_streams(run, &output);

        if !output.success() {
            warn!(job_pk = run.job_pk(), exit_code = ?output.code, "container failed");
            report_failure(&self.reporter, failure_reason(self.runtime.binary(), &output)).await;
            return RunOutcome::ContainerFailed { code: output.code };
        }

        if let Err(e) = self.upload_output(run).await {
            let reason = e.to_string();
            report_failure(&self.reporter, reason.clone()).await;
            return RunOutcome::OutputFailed(reason);
        }

        self.complete(run).await;
        RunOutcome::Completed
    }

    /// Create the working directory and fetch the bound input into it.
    async fn stage_input(&self, run: &Run) -> Result<Option<PathBuf>> {
        self.fs
            .create_dir_all(run.workdir())
            .map_err(|e| ClustersideError::BackendError(format!("{e:#}")))?;

        let Some(binding) = run.input() else {
            debug!(job_pk = run.job_pk(), "no input bound");
            return Ok(None);
        };

        let path = &binding.descriptor.path;
        info!(job_pk = run.job_pk(), path = %path, storage = ?binding.descriptor.storage, "staging input");

        let store = Store::for_binding(binding, self.connector.clone(), Arc::clone(&self.fs))?;
        let staged = store.fetch(path, run.workdir()).await?;

        info!(job_pk = run.job_pk(), path = %staged.display(), "input staged");
        Ok(Some(staged))
    }

    async fn upload_output(&self, run: &Run) -> Result<()> {
        let Some(binding) = run.output() else {
            return Ok(());
        };

        let local = match &binding.local_path {
            Some(rel) => run.workdir().join(rel),
            None => run.workdir().to_path_buf(),
        };
        let remote = &binding.descriptor.path;
        info!(job_pk = run.job_pk(), local = %local.display(), path = %remote, "uploading output");

        let store = Store::for_binding(binding, self.connector.clone(), Arc::clone(&self.fs))?;
        store.put(&local, remote).await
    }

    async fn complete(&self, run: &Run) {
        if let Err(e) = self.reporter.update_status(&JobStatus::Completed).await {
            warn!(job_pk = run.job_pk(), error = %e, "could not report COMPLETED");
        }

        match run.task_pk() {
            Some(task_pk) => {
                if let Err(e) = self.reporter.task_complete(task_pk).await {
                    warn!(job_pk = run.job_pk(), task_pk, error = %e, "could not report task completion");
                }
            }
            None => warn!(job_pk = run.job_pk(), "no task_pk configured; skipping task_complete"),
        }
    }

    /// Write non-empty stdout/stderr next to the output directory.
    fn persist_streams(&self, run: &Run, output: &ProcessOutput) {
        for (stream, text) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
            if text.is_empty() {
                continue;
            }
            let path = artifact_path(&self.output_dir, run.identifier(), stream);
            match self.fs.write(&path, text.as_bytes()) {
                Ok(()) => debug!(path = %path.display(), "captured {stream}"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not persist {stream}"),
            }
        }
    }
}

fn artifact_path(dir: &Path, identifier: &str, stream: &str) -> PathBuf {
    dir.join(format!("{identifier}.{stream}"))
}

/// Message for a non-zero exit: the captured stderr verbatim, or the exit
/// code when the program wrote nothing to stderr.
pub(crate) fn failure_reason(program: &str, output: &ProcessOutput) -> String {
    if !output.stderr.is_empty() {
        return output.stderr.clone();
    }
    match output.code {
        Some(code) => format!("{program} exited with code {code}"),
        None => format!("{program} was terminated by a signal"),
    }
}
