// src/job/mod.rs

//! The unit of work: one [`Run`] per invocation.
//!
//! A `Run` is built once from the validated job config and never mutated.
//! Construction is a pure transform; the only I/O is the config read that
//! happened before it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::validate::INPUT_KEY;
use crate::config::{Binding, JobConfig, Param};
use crate::errors::{ClustersideError, Result};

/// Variables the container runtime defines itself; commands may use them
/// without declaring a parameter.
const RUNTIME_VARS: [&str; 3] = ["HOME", "PWD", "PATH"];

static COMMAND_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Z_][A-Z0-9_]*)\}|([A-Z_][A-Z0-9_]*))").expect("valid regex")
});

/// Immutable description of one container invocation.
#[derive(Debug, Clone)]
pub struct Run {
    identifier: String,
    job_pk: i64,
    task_pk: Option<i64>,
    workdir: PathBuf,
    image: String,
    command: String,
    params: Vec<Param>,
    input: Option<Binding>,
    output: Option<Binding>,
}

impl Run {
    /// Build a run from the job config.
    ///
    /// `api_url` is the resolved status endpoint; when it is non-empty an
    /// `auth_token` must be present.
    pub fn from_config(cfg: &JobConfig, api_url: &str) -> Result<Self> {
        let image = cfg
            .image
            .clone()
            .ok_or_else(|| missing("image (or singularity_url)"))?;
        let command = cfg.command.clone().ok_or_else(|| missing("command"))?;
        cfg.auth_token_for(api_url)?;

        check_command_references(&command, &cfg.parameters, cfg.input.is_some())?;

        Ok(Self {
            identifier: cfg.job_pk.to_string(),
            job_pk: cfg.job_pk,
            task_pk: cfg.task_pk,
            workdir: cfg.workdir.clone(),
            image,
            command,
            params: cfg.parameters.clone(),
            input: cfg.input.clone(),
            output: cfg.output.clone(),
        })
    }

    /// Unique per invocation; names the `.stdout`/`.stderr` artifacts.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn job_pk(&self) -> i64 {
        self.job_pk
    }

    pub fn task_pk(&self) -> Option<i64> {
        self.task_pk
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn input(&self) -> Option<&Binding> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&Binding> {
        self.output.as_ref()
    }
}

fn missing(field: &str) -> ClustersideError {
    ClustersideError::ConfigError(format!("missing required field `{field}`"))
}

fn check_command_references(command: &str, params: &[Param], input_bound: bool) -> Result<()> {
    let known: HashSet<&str> = params.iter().map(|p| p.key.as_str()).collect();

    for caps in COMMAND_REF.captures_iter(command) {
        let Some(name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            continue;
        };

        if known.contains(name) || RUNTIME_VARS.contains(&name) {
            continue;
        }
        if name == INPUT_KEY {
            if input_bound {
                continue;
            }
            return Err(ClustersideError::ConfigError(format!(
                "command references ${INPUT_KEY} but no input is bound"
            )));
        }
        return Err(ClustersideError::ConfigError(format!(
            "command references unknown parameter ${name}"
        )));
    }

    Ok(())
}
