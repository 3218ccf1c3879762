#![allow(dead_code)]

use clusterside::config::{JobConfig, RawJobConfig};
use clusterside::errors::Result;
use serde_json::{Map, Value, json};

/// Builder for `JobConfig` to simplify test setup.
///
/// Starts from a minimal runnable job (`job_pk`, `task_pk`, an image, a
/// command and an auth token) and goes through the same JSON → raw →
/// validated path as a config read from disk.
pub struct JobConfigBuilder {
    fields: Map<String, Value>,
}

impl JobConfigBuilder {
    pub fn new(job_pk: i64) -> Self {
        let mut fields = Map::new();
        fields.insert("job_pk".into(), json!(job_pk));
        fields.insert("task_pk".into(), json!(job_pk * 10));
        fields.insert("auth_token".into(), json!("test-token"));
        fields.insert("image".into(), json!("docker://alpine:latest"));
        fields.insert("command".into(), json!("true"));
        Self { fields }
    }

    pub fn task_pk(self, task_pk: i64) -> Self {
        self.field("task_pk", json!(task_pk))
    }

    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    pub fn image(self, image: &str) -> Self {
        self.field("image", json!(image))
    }

    pub fn command(self, command: &str) -> Self {
        self.field("command", json!(command))
    }

    pub fn workdir(self, workdir: impl AsRef<std::path::Path>) -> Self {
        let workdir = workdir.as_ref().to_string_lossy().into_owned();
        self.field("workdir", json!(workdir))
    }

    pub fn server_url(self, url: &str) -> Self {
        self.field("server_url", json!(url))
    }

    /// Append one parameter, keeping declaration order.
    pub fn param(mut self, key: &str, value: &str) -> Self {
        let params = self
            .fields
            .entry("parameters")
            .or_insert_with(|| json!([]));
        if let Value::Array(list) = params {
            list.push(json!({"key": key, "value": value}));
        }
        self
    }

    pub fn input(self, binding: Value) -> Self {
        self.field("input", binding)
    }

    pub fn output(self, binding: Value) -> Self {
        self.field("output", binding)
    }

    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn try_build(self) -> Result<JobConfig> {
        JobConfig::try_from(RawJobConfig::from_value(Value::Object(self.fields))?)
    }

    pub fn build(self) -> JobConfig {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

/// A local file binding.
pub fn local_file(path: &str) -> Value {
    json!({"kind": "file", "storage": "local", "path": path})
}

/// A remote binding with test connection details.
pub fn irods(kind: &str, path: &str, recursive: bool) -> Value {
    json!({
        "kind": kind,
        "path": path,
        "host": "irods.example.org",
        "user": "rods",
        "password": "secret",
        "zone": "tempZone",
        "recursive": recursive,
    })
}
