// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod job;
pub mod logging;
pub mod report;
pub mod store;
pub mod submit;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command, expand_home};
use crate::config::load_and_validate;
use crate::exec::{ContainerRuntime, Executor, RealProcessBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::job::Run;
use crate::report::HttpReporter;
use crate::store::IcommandsConnector;
use crate::submit::SubmissionBridge;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and status endpoint resolution
/// - the HTTP status reporter
/// - either the submission bridge or the executor, per subcommand
///
/// Only configuration errors and a missing scheduler come back as `Err`;
/// job outcomes are communicated through status reports.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let api_url = args.api_url(cfg.server_url.as_deref());
    let token = cfg.auth_token_for(&api_url)?;
    let reporter = HttpReporter::new(&api_url, token, cfg.job_pk)?;

    if !reporter.is_enabled() {
        warn!(job_pk = cfg.job_pk, "status endpoint is empty; reporting disabled");
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match &args.command {
        Command::Submit { script, scheduler } => {
            let template = expand_home(script);
            let bridge = SubmissionBridge::new(RealProcessBackend, reporter, fs)
                .with_scheduler(scheduler.as_str());

            let outcome = bridge.submit(&cfg, &template).await?;
            info!(job_pk = cfg.job_pk, ?outcome, "submission finished");
        }
        Command::Run { runtime } => {
            let run = Run::from_config(&cfg, &api_url)?;
            let executor = Executor::new(
                RealProcessBackend,
                reporter,
                IcommandsConnector::new(RealProcessBackend),
                fs,
            )
            .with_runtime(ContainerRuntime::new(runtime.as_str()));

            let outcome = executor.execute(&run).await;
            info!(job_pk = cfg.job_pk, ?outcome, "run finished");
        }
    }

    Ok(())
}
