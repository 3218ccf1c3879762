// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClustersideError {
    /// Malformed or missing configuration. Fatal, raised before any
    /// external call is made.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Requested remote object/collection is absent, or is a collection that
    /// was skipped because recursion was not requested.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote store transport or authentication failure.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// An external binary could not be started at all.
    #[error("failed to invoke '{program}': {source}")]
    ProcessInvocation {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external binary ran but exited non-zero.
    #[error("'{program}' exited with code {code:?}: {stderr}")]
    ProcessExecution {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The status-report channel failed to deliver an update.
    #[error("Status report failed: {0}")]
    Report(String),

    /// The scheduler binary is missing; the only condition that ends the
    /// process with a non-zero exit code after configuration was loaded.
    #[error("Scheduler unavailable: {0}")]
    SchedulerUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ClustersideError {
    fn from(e: reqwest::Error) -> Self {
        ClustersideError::Report(e.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ClustersideError>;
