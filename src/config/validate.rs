// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::config::model::{Binding, JobConfig, Param, RawBinding, RawJobConfig, RawParameters};
use crate::errors::{ClustersideError, Result};
use crate::store::{DEFAULT_IRODS_PORT, RemoteCredentials, StoreDescriptor};
use crate::types::{InputKind, StorageKind};

/// Environment variable name the staged input path is exposed under.
pub const INPUT_KEY: &str = "INPUT";

static ENV_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

impl TryFrom<RawJobConfig> for JobConfig {
    type Error = ClustersideError;

    fn try_from(raw: RawJobConfig) -> std::result::Result<Self, Self::Error> {
        let job_pk = raw.job_pk.ok_or_else(|| missing("job_pk"))?;

        let api_version = raw.api_version.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        });

        let image = non_blank("image", raw.image)?;
        let command = non_blank("command", raw.command)?;
        let parameters = validate_parameters(raw.parameters)?;

        let input = raw
            .input
            .map(|b| validate_binding("input", b))
            .transpose()?;
        let output = raw
            .output
            .map(|b| validate_binding("output", b))
            .transpose()?;

        if input.as_ref().is_some_and(|b| b.local_path.is_some()) {
            return Err(ClustersideError::ConfigError(
                "input.local_path is only valid on output bindings".to_string(),
            ));
        }

        Ok(JobConfig::new_unchecked(
            api_version,
            job_pk,
            raw.task_pk,
            raw.auth_token,
            raw.server_url,
            image,
            command,
            raw.workdir.unwrap_or_else(|| PathBuf::from(".")),
            parameters,
            input,
            output,
            raw.fields,
        ))
    }
}

fn missing(field: &str) -> ClustersideError {
    ClustersideError::ConfigError(format!("missing required field `{field}`"))
}

/// Present-but-blank strings are as bad as absent ones for the fields the
/// run path needs; absence itself is checked where the field is required.
fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ClustersideError::ConfigError(format!(
            "`{field}` must not be empty"
        ))),
        other => Ok(other),
    }
}

fn validate_parameters(raw: Option<RawParameters>) -> Result<Vec<Param>> {
    let pairs: Vec<(Option<String>, Option<Value>)> = match raw {
        None => return Ok(Vec::new()),
        Some(RawParameters::Pairs(list)) => {
            list.into_iter().map(|p| (p.key, p.value)).collect()
        }
        Some(RawParameters::Map(map)) => {
            map.into_iter().map(|(k, v)| (Some(k), Some(v))).collect()
        }
    };

    let mut seen = HashSet::new();
    let mut params = Vec::with_capacity(pairs.len());

    for (idx, (key, value)) in pairs.into_iter().enumerate() {
        let key = key.ok_or_else(|| {
            ClustersideError::ConfigError(format!("parameters[{idx}] is missing `key`"))
        })?;
        let value = value.ok_or_else(|| {
            ClustersideError::ConfigError(format!("parameter '{key}' is missing `value`"))
        })?;

        if !ENV_KEY.is_match(&key) {
            return Err(ClustersideError::ConfigError(format!(
                "parameter '{key}' is not a valid environment variable name"
            )));
        }
        if key == INPUT_KEY {
            return Err(ClustersideError::ConfigError(format!(
                "parameter name '{INPUT_KEY}' is reserved for the staged input"
            )));
        }
        if !seen.insert(key.clone()) {
            return Err(ClustersideError::ConfigError(format!(
                "duplicate parameter '{key}'"
            )));
        }

        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(ClustersideError::ConfigError(format!(
                    "parameter '{key}' must be a string, number or boolean (got {other})"
                )));
            }
        };

        params.push(Param { key, value });
    }

    Ok(params)
}

fn validate_binding(field: &str, raw: RawBinding) -> Result<Binding> {
    let kind: InputKind = raw
        .kind
        .as_deref()
        .ok_or_else(|| missing(&format!("{field}.kind")))?
        .parse()
        .map_err(|e| ClustersideError::ConfigError(format!("{field}.kind: {e}")))?;

    let storage = match raw.storage.as_deref() {
        Some(s) => s
            .parse::<StorageKind>()
            .map_err(|e| ClustersideError::ConfigError(format!("{field}.storage: {e}")))?,
        None if raw.host.is_some() => StorageKind::Irods,
        None => StorageKind::Local,
    };

    let path = raw
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| missing(&format!("{field}.path")))?;

    let credentials = match storage {
        StorageKind::Local => None,
        StorageKind::Irods => Some(RemoteCredentials {
            host: required(field, "host", raw.host)?,
            port: raw.port.unwrap_or(DEFAULT_IRODS_PORT),
            user: required(field, "user", raw.user)?,
            password: raw.password,
            zone: required(field, "zone", raw.zone)?,
        }),
    };

    Ok(Binding {
        kind,
        descriptor: StoreDescriptor {
            storage,
            path,
            credentials,
            recursive: raw.recursive.unwrap_or(false),
        },
        local_path: raw.local_path.map(PathBuf::from),
    })
}

fn required(binding: &str, name: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(&format!("{binding}.{name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<JobConfig> {
        JobConfig::try_from(RawJobConfig::from_value(value)?)
    }

    #[test]
    fn object_parameters_keep_declared_order() {
        let cfg = parse(json!({
            "job_pk": 1,
            "parameters": {"ZETA": "z", "ALPHA": 1, "MID": true}
        }))
        .unwrap();

        let keys: Vec<_> = cfg.parameters.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["ZETA", "ALPHA", "MID"]);
        assert_eq!(cfg.parameters[1].value, "1");
        assert_eq!(cfg.parameters[2].value, "true");
    }

    #[test]
    fn pair_parameters_require_key_and_value() {
        let err = parse(json!({"job_pk": 1, "parameters": [{"value": "x"}]})).unwrap_err();
        assert!(matches!(err, ClustersideError::ConfigError(ref m) if m.contains("missing `key`")));

        let err = parse(json!({"job_pk": 1, "parameters": [{"key": "A"}]})).unwrap_err();
        assert!(matches!(err, ClustersideError::ConfigError(ref m) if m.contains("missing `value`")));
    }

    #[test]
    fn duplicate_and_reserved_keys_are_rejected() {
        let err = parse(json!({
            "job_pk": 1,
            "parameters": [{"key": "A", "value": "1"}, {"key": "A", "value": "2"}]
        }))
        .unwrap_err();
        assert!(matches!(err, ClustersideError::ConfigError(ref m) if m.contains("duplicate")));

        let err = parse(json!({"job_pk": 1, "parameters": {"INPUT": "x"}})).unwrap_err();
        assert!(matches!(err, ClustersideError::ConfigError(ref m) if m.contains("reserved")));
    }

    #[test]
    fn unknown_binding_kind_is_a_config_error() {
        let err = parse(json!({
            "job_pk": 1,
            "input": {"kind": "bucket", "path": "/data"}
        }))
        .unwrap_err();
        assert!(matches!(err, ClustersideError::ConfigError(ref m) if m.contains("input.kind")));
    }

    #[test]
    fn storage_is_inferred_from_host() {
        let cfg = parse(json!({
            "job_pk": 1,
            "input": {
                "kind": "directory",
                "host": "irods",
                "user": "rods",
                "password": "rods",
                "zone": "tempZone",
                "irods_path": "/tempZone/coll"
            }
        }))
        .unwrap();

        let input = cfg.input.unwrap();
        assert_eq!(input.kind, InputKind::Directory);
        assert_eq!(input.descriptor.storage, StorageKind::Irods);
        assert_eq!(input.descriptor.path, "/tempZone/coll");
        assert!(!input.descriptor.recursive);
        let creds = input.descriptor.credentials.unwrap();
        assert_eq!(creds.port, DEFAULT_IRODS_PORT);
        assert_eq!(creds.zone, "tempZone");
    }

    #[test]
    fn remote_binding_needs_connection_details() {
        let err = parse(json!({
            "job_pk": 1,
            "input": {"kind": "file", "storage": "irods", "host": "irods", "path": "/z/f"}
        }))
        .unwrap_err();
        assert!(matches!(err, ClustersideError::ConfigError(ref m) if m.contains("input.user")));
    }

    #[test]
    fn missing_job_pk_is_a_config_error() {
        let err = parse(json!({"image": "docker://alpine"})).unwrap_err();
        assert!(matches!(err, ClustersideError::ConfigError(ref m) if m.contains("job_pk")));
    }
}
