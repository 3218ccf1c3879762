// src/logging.rs

//! Tracing subscriber for the `clusterside` binary.
//!
//! The filter comes from `--log-level`, else `CLUSTERSIDE_LOG`, else
//! `info`. `CLUSTERSIDE_LOG` takes either a bare level (`debug`) or full
//! `EnvFilter` directives (`clusterside=trace,reqwest=debug`). With a bare
//! level the HTTP stack stays at `warn`.
//!
//! Output goes to stderr; stdout only carries the scheduler's answer on
//! submission.

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "CLUSTERSIDE_LOG";

const QUIET_DEPS: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::try_new(directives(cli_level, env.as_deref()))
        .or_else(|_| EnvFilter::try_new(directives(cli_level, None)))
        .context("building log filter")?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

fn directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    let env = env.map(str::trim).filter(|s| !s.is_empty());
    let level = match (cli_level, env) {
        (Some(level), _) => level_name(level).to_string(),
        (None, Some(spec)) if spec.contains('=') => return spec.to_string(),
        (None, Some(level)) => match level.to_lowercase().as_str() {
            "warning" => "warn".to_string(),
            other => other.to_string(),
        },
        (None, None) => "info".to_string(),
    };
    format!("{level},{QUIET_DEPS}")
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
