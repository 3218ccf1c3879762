// src/config/loader.rs

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::config::model::{JobConfig, RawJobConfig};
use crate::errors::{ClustersideError, Result};

/// Load a job config artifact from a given path and return the raw model.
///
/// This only performs JSON deserialization; it does **not** check required
/// fields or binding shapes. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        ClustersideError::ConfigError(format!("reading job config {}: {e}", path.display()))
    })?;

    let value: Value = serde_json::from_str(&contents).map_err(|e| {
        ClustersideError::ConfigError(format!("parsing job config {}: {e}", path.display()))
    })?;

    RawJobConfig::from_value(value)
}

/// Load a job config artifact from path and validate it.
///
/// This is the entry point for both subcommands: the config is read exactly
/// once, before any external call.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobConfig> {
    let raw = load_from_path(&path)?;
    JobConfig::try_from(raw)
}
