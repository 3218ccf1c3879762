// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Status endpoint used when neither `--url` nor `server_url` is given.
pub const DEFAULT_API_URL: &str = "http://localhost/jobs/api/";

/// Command-line arguments for `clusterside`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "clusterside",
    version,
    about = "Cluster side of the job platform: submit jobs and run them in containers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job config file (JSON).
    #[arg(long, value_name = "PATH", default_value = "./job_config.json", global = true)]
    pub config: PathBuf,

    /// Status endpoint of the controlling server.
    ///
    /// Falls back to `server_url` from the job config, then to
    /// `http://localhost/jobs/api/`. An empty value disables reporting.
    #[arg(long, value_name = "URL", global = true)]
    pub url: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CLUSTERSIDE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render the submission script and hand it to the batch scheduler.
    Submit {
        /// Submission script template.
        #[arg(long, value_name = "PATH", default_value = "~/.clusterside/submit.sh")]
        script: String,

        /// Scheduler binary that accepts the rendered script.
        #[arg(long, value_name = "BIN", default_value = "qsub")]
        scheduler: String,
    },

    /// Stage inputs and run the job's container.
    Run {
        /// Container runtime binary.
        #[arg(long, value_name = "BIN", default_value = "singularity")]
        runtime: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

impl CliArgs {
    /// Resolve the status endpoint: flag, then config, then the default.
    pub fn api_url(&self, server_url: Option<&str>) -> String {
        self.url
            .as_deref()
            .or(server_url)
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }
}

/// Expand a leading `~/` using `HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
