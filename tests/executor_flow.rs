// tests/executor_flow.rs

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use clusterside_test_utils::builders::{JobConfigBuilder, irods, local_file};
use clusterside_test_utils::fake_process::FakeProcessBackend;
use clusterside_test_utils::init_tracing;
use clusterside_test_utils::recording_reporter::RecordingReporter;

use clusterside::config::JobConfig;
use clusterside::exec::{Executor, RunOutcome};
use clusterside::fs::RealFileSystem;
use clusterside::job::Run;
use clusterside::store::mock::MockCollection;
use clusterside::types::JobStatus;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

const API: &str = "http://localhost/jobs/api/";

struct Harness {
    dir: TempDir,
    backend: FakeProcessBackend,
    reporter: RecordingReporter,
    zone: MockCollection,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            backend: FakeProcessBackend::new(),
            reporter: RecordingReporter::new(),
            zone: MockCollection::new(),
        }
    }

    fn workdir(&self) -> std::path::PathBuf {
        self.dir.path().join("work")
    }

    fn config(&self, job_pk: i64) -> JobConfigBuilder {
        JobConfigBuilder::new(job_pk).workdir(self.workdir())
    }

    async fn execute(&self, cfg: &JobConfig) -> Result<RunOutcome, Box<dyn Error>> {
        let run = Run::from_config(cfg, API)?;
        let executor = Executor::new(
            self.backend.clone(),
            self.reporter.clone(),
            self.zone.clone(),
            Arc::new(RealFileSystem),
        )
        .with_output_dir(self.dir.path());
        Ok(executor.execute(&run).await)
    }

    fn artifact(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.dir.path().join(name)).ok()
    }
}

#[tokio::test]
async fn successful_run_reports_running_then_completed() -> TestResult {
    let h = Harness::new();
    h.backend.respond("singularity", 0, "hello\n", "");

    let outcome = h.execute(&h.config(7).build()).await?;

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(h.reporter.statuses(), vec![JobStatus::Running, JobStatus::Completed]);
    assert_eq!(h.reporter.task_completions(), vec![70]);
    assert_eq!(h.artifact("7.stdout").as_deref(), Some("hello\n"));
    assert_eq!(h.artifact("7.stderr"), None);
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_forwards_stderr_and_persists_it() -> TestResult {
    let h = Harness::new();
    h.backend.respond("singularity", 2, "", "boom");

    let outcome = h.execute(&h.config(7).build()).await?;

    assert_eq!(outcome, RunOutcome::ContainerFailed { code: Some(2) });
    assert_eq!(
        h.reporter.statuses(),
        vec![JobStatus::Running, JobStatus::Failed("boom".to_string())]
    );
    assert!(h.reporter.task_completions().is_empty());
    assert_eq!(h.artifact("7.stderr").as_deref(), Some("boom"));
    assert_eq!(h.artifact("7.stdout"), None);
    Ok(())
}

#[tokio::test]
async fn stderr_on_success_is_persisted_but_not_a_failure() -> TestResult {
    let h = Harness::new();
    h.backend.respond("singularity", 0, "", "WARNING: underlay");

    let outcome = h.execute(&h.config(3).build()).await?;

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(h.reporter.statuses(), vec![JobStatus::Running, JobStatus::Completed]);
    assert_eq!(h.artifact("3.stderr").as_deref(), Some("WARNING: underlay"));
    Ok(())
}

#[tokio::test]
async fn container_gets_parameters_and_no_input_when_unbound() -> TestResult {
    let h = Harness::new();
    let cfg = h
        .config(4)
        .command("echo $MESSAGE")
        .param("MESSAGE", "Message!")
        .build();

    h.execute(&cfg).await?;

    let calls = h.backend.requests_for("singularity");
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.args[0], "exec");
    assert!(call.args.contains(&"docker://alpine:latest".to_string()));
    assert_eq!(call.args.last().map(String::as_str), Some("echo $MESSAGE"));
    assert_eq!(call.env_value("SINGULARITYENV_MESSAGE"), Some("Message!"));
    assert_eq!(call.env_value("SINGULARITYENV_INPUT"), None);
    assert_eq!(h.zone.sessions_opened(), 0);
    assert!(h.workdir().is_dir());
    Ok(())
}

#[tokio::test]
async fn remote_input_is_staged_into_the_workdir() -> TestResult {
    let h = Harness::new();
    h.zone.add_object("/tempZone/home/rods/sample.txt", "ACGT");
    let cfg = h
        .config(5)
        .command("wc -c $INPUT")
        .input(irods("file", "/tempZone/home/rods/sample.txt", false))
        .build();

    let outcome = h.execute(&cfg).await?;

    assert_eq!(outcome, RunOutcome::Completed);
    let staged = h.workdir().join("sample.txt");
    assert_eq!(fs::read_to_string(&staged)?, "ACGT");

    let call = &h.backend.requests_for("singularity")[0];
    let expected = staged.to_string_lossy().into_owned();
    assert_eq!(call.env_value("SINGULARITYENV_INPUT"), Some(expected.as_str()));
    assert_eq!(h.zone.sessions_opened(), 1);
    assert_eq!(h.zone.sessions_closed(), 1);
    Ok(())
}

#[tokio::test]
async fn remote_collection_needs_recursion() -> TestResult {
    let h = Harness::new();
    h.zone.add_object("/tempZone/home/rods/set/a.txt", "a");
    let cfg = h
        .config(6)
        .input(irods("directory", "/tempZone/home/rods/set", false))
        .build();

    let outcome = h.execute(&cfg).await?;

    assert!(matches!(outcome, RunOutcome::StagingFailed(ref m) if m.contains("skipping")));
    assert!(h.backend.requests_for("singularity").is_empty());
    assert_eq!(h.zone.sessions_closed(), h.zone.sessions_opened());
    Ok(())
}

#[tokio::test]
async fn missing_input_fails_before_the_container_starts() -> TestResult {
    let h = Harness::new();
    let cfg = h
        .config(8)
        .input(irods("file", "/tempZone/home/rods/absent.txt", false))
        .build();

    let outcome = h.execute(&cfg).await?;

    assert!(matches!(outcome, RunOutcome::StagingFailed(_)));
    assert!(h.backend.requests_for("singularity").is_empty());

    let statuses = h.reporter.statuses();
    assert_eq!(statuses.len(), 1);
    assert!(
        matches!(&statuses[0], JobStatus::Failed(m) if m.contains("does not exist")),
        "{statuses:?}"
    );
    assert_eq!(h.zone.sessions_opened(), 1);
    assert_eq!(h.zone.sessions_closed(), 1);
    Ok(())
}

#[tokio::test]
async fn local_input_is_copied_into_the_workdir() -> TestResult {
    let h = Harness::new();
    let source = h.dir.path().join("data.csv");
    fs::write(&source, "x,y\n")?;
    let cfg = h
        .config(9)
        .input(local_file(&source.to_string_lossy()))
        .build();

    let outcome = h.execute(&cfg).await?;

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(fs::read_to_string(h.workdir().join("data.csv"))?, "x,y\n");
    Ok(())
}

#[tokio::test]
async fn missing_runtime_is_reported_as_failed() -> TestResult {
    let h = Harness::new();
    h.backend.missing("singularity");

    let outcome = h.execute(&h.config(10).build()).await?;

    assert!(matches!(outcome, RunOutcome::InvocationFailed(ref m) if m.contains("singularity")));
    let statuses = h.reporter.statuses();
    assert_eq!(statuses[0], JobStatus::Running);
    assert!(statuses[1].is_failure());
    assert!(h.reporter.task_completions().is_empty());
    Ok(())
}

#[tokio::test]
async fn undeliverable_running_aborts_the_run() -> TestResult {
    let h = Harness::new();
    h.reporter.fail_on(JobStatus::Running);

    let outcome = h.execute(&h.config(11).build()).await?;

    assert!(matches!(outcome, RunOutcome::ReportingFailed(_)));
    assert!(h.backend.requests().is_empty());
    let statuses = h.reporter.statuses();
    assert_eq!(statuses.len(), 2);
    assert!(statuses[1].is_failure());
    Ok(())
}

#[tokio::test]
async fn undeliverable_failed_never_masks_the_failure() -> TestResult {
    let h = Harness::new();
    h.reporter.fail_on(JobStatus::Failed(String::new()));
    h.backend.respond("singularity", 1, "", "bad");

    let outcome = h.execute(&h.config(12).build()).await?;

    assert_eq!(outcome, RunOutcome::ContainerFailed { code: Some(1) });
    assert_eq!(h.artifact("12.stderr").as_deref(), Some("bad"));
    Ok(())
}

#[tokio::test]
async fn output_is_uploaded_before_completion() -> TestResult {
    let h = Harness::new();
    fs::create_dir_all(h.workdir().join("out"))?;
    fs::write(h.workdir().join("out/result.txt"), "42")?;
    let mut binding = irods("directory", "/tempZone/home/rods/results", false);
    binding["local_path"] = "out".into();
    let cfg = h.config(13).output(binding).build();

    let outcome = h.execute(&cfg).await?;

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(
        h.zone.uploads(),
        vec![(
            h.workdir().join("out"),
            "/tempZone/home/rods/results".to_string(),
            true
        )]
    );
    assert_eq!(h.reporter.task_completions(), vec![130]);
    Ok(())
}

#[tokio::test]
async fn failed_upload_reports_failed_without_task_completion() -> TestResult {
    let h = Harness::new();
    h.zone.fail_transfers("connection reset");
    let cfg = h
        .config(14)
        .output(irods("file", "/tempZone/home/rods/results", false))
        .build();

    let outcome = h.execute(&cfg).await?;

    assert!(matches!(outcome, RunOutcome::OutputFailed(ref m) if m.contains("connection reset")));
    let statuses = h.reporter.statuses();
    assert_eq!(statuses.len(), 2);
    assert!(statuses[1].is_failure());
    assert!(h.reporter.task_completions().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_task_pk_skips_task_completion() -> TestResult {
    let h = Harness::new();
    let cfg = h.config(15).without("task_pk").build();

    let outcome = h.execute(&cfg).await?;

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(h.reporter.task_completions().is_empty());
    assert!(Path::new(&h.workdir()).is_dir());
    Ok(())
}
