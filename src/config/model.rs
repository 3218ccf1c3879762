// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{ClustersideError, Result};
use crate::store::StoreDescriptor;
use crate::types::InputKind;

/// Job configuration as read from the JSON artifact written by the server.
///
/// ```json
/// {
///   "api_version": "0.1",
///   "job_pk": 7,
///   "task_pk": 12,
///   "auth_token": "abc",
///   "server_url": "https://example.org/jobs/api/",
///   "singularity_url": "docker://alpine:latest",
///   "command": "echo $MESSAGE && cat $INPUT",
///   "parameters": {"MESSAGE": "hello"},
///   "input": {"kind": "file", "host": "irods", "user": "rods", "zone": "tempZone",
///             "irods_path": "/tempZone/home/rods/sample.txt"}
/// }
/// ```
///
/// Every field is optional at this stage; [`JobConfig`]'s `TryFrom` impl
/// decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJobConfig {
    #[serde(default)]
    pub api_version: Option<Value>,

    #[serde(default)]
    pub job_pk: Option<i64>,

    #[serde(default)]
    pub task_pk: Option<i64>,

    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub server_url: Option<String>,

    /// Container image reference (`docker://...`, `shub://...`, a local .sif).
    #[serde(default, alias = "singularity_url")]
    pub image: Option<String>,

    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub workdir: Option<PathBuf>,

    #[serde(default)]
    pub parameters: Option<RawParameters>,

    #[serde(default)]
    pub input: Option<RawBinding>,

    #[serde(default)]
    pub output: Option<RawBinding>,

    /// The complete top-level object, kept for template substitution.
    #[serde(skip)]
    pub fields: Map<String, Value>,
}

impl RawJobConfig {
    /// Map an already-parsed JSON document onto the raw model.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(ClustersideError::ConfigError(
                "job config must be a JSON object".to_string(),
            ));
        };

        let mut raw: RawJobConfig = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| ClustersideError::ConfigError(format!("invalid job config: {e}")))?;
        raw.fields = fields;
        Ok(raw)
    }
}

/// `parameters` may be an ordered object or a list of `{key, value}` pairs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawParameters {
    Pairs(Vec<RawParam>),
    Map(Map<String, Value>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParam {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

/// `input` / `output` binding as written in the config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBinding {
    #[serde(default)]
    pub kind: Option<String>,

    /// `"irods"` or `"local"`; inferred from `host` when absent.
    #[serde(default)]
    pub storage: Option<String>,

    #[serde(default, alias = "irods_path")]
    pub path: Option<String>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub zone: Option<String>,

    /// Opt into recursive staging of collections.
    #[serde(default)]
    pub recursive: Option<bool>,

    /// Output bindings only: what to upload, relative to `workdir`.
    #[serde(default)]
    pub local_path: Option<String>,
}

/// One `{key, value}` parameter, exported to the container environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// A validated input or output binding.
#[derive(Debug, Clone)]
pub struct Binding {
    pub kind: InputKind,
    pub descriptor: StoreDescriptor,
    /// Source of an upload, relative to the run's working directory.
    pub local_path: Option<PathBuf>,
}

/// Validated job configuration.
///
/// Construct via `JobConfig::try_from(raw)`; see `validate.rs`.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub api_version: Option<String>,
    pub job_pk: i64,
    pub task_pk: Option<i64>,
    pub auth_token: Option<String>,
    pub server_url: Option<String>,
    pub image: Option<String>,
    pub command: Option<String>,
    pub workdir: PathBuf,
    pub parameters: Vec<Param>,
    pub input: Option<Binding>,
    pub output: Option<Binding>,
    fields: Map<String, Value>,
}

impl JobConfig {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        api_version: Option<String>,
        job_pk: i64,
        task_pk: Option<i64>,
        auth_token: Option<String>,
        server_url: Option<String>,
        image: Option<String>,
        command: Option<String>,
        workdir: PathBuf,
        parameters: Vec<Param>,
        input: Option<Binding>,
        output: Option<Binding>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            api_version,
            job_pk,
            task_pk,
            auth_token,
            server_url,
            image,
            command,
            workdir,
            parameters,
            input,
            output,
            fields,
        }
    }

    /// Text substituted for `{name}` in a submission template.
    ///
    /// Strings are inserted verbatim, other values as compact JSON. `image`
    /// and `singularity_url` resolve to each other. Null or absent fields
    /// are unresolved.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = self.fields.get(name).or_else(|| match name {
            "image" => self.fields.get("singularity_url"),
            "singularity_url" => self.fields.get("image"),
            _ => None,
        })?;

        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Token used to authenticate status reports to `api_url`.
    ///
    /// An empty `api_url` disables reporting, so no token is needed.
    pub fn auth_token_for(&self, api_url: &str) -> Result<Option<&str>> {
        if api_url.trim().is_empty() {
            return Ok(None);
        }
        match self.auth_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(Some(token)),
            _ => Err(ClustersideError::ConfigError(
                "auth_token is required when status reporting is enabled".to_string(),
            )),
        }
    }
}
