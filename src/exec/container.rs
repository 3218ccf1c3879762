// src/exec/container.rs

//! Building the container runtime invocation for a [`Run`].

use std::path::Path;

use crate::config::validate::INPUT_KEY;
use crate::exec::backend::ProcessRequest;
use crate::job::Run;

/// Prefix singularity/apptainer strips when injecting variables into a
/// clean container environment.
pub const ENV_PREFIX: &str = "SINGULARITYENV_";

/// The container runtime binary plus the isolation flags we request.
#[derive(Debug, Clone)]
pub struct ContainerRuntime {
    binary: String,
}

impl Default for ContainerRuntime {
    fn default() -> Self {
        Self::new("singularity")
    }
}

impl ContainerRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Request that runs `run.command` inside `run.image`, confined to
    /// `workdir`, with only the run's parameters (and `INPUT`, if staged)
    /// visible in the container environment.
    pub fn request(&self, run: &Run, workdir: &Path, input: Option<&Path>) -> ProcessRequest {
        let workdir_str = workdir.to_string_lossy().into_owned();

        let mut request = ProcessRequest::new(&self.binary)
            .args([
                "exec",
                "--containall",
                "--cleanenv",
                "--home",
                workdir_str.as_str(),
                "--pwd",
                workdir_str.as_str(),
                run.image(),
                "sh",
                "-c",
                run.command(),
            ])
            .cwd(workdir);

        for param in run.params() {
            request = request.env(format!("{ENV_PREFIX}{}", param.key), &param.value);
        }
        if let Some(path) = input {
            request = request.env(
                format!("{ENV_PREFIX}{INPUT_KEY}"),
                path.to_string_lossy().into_owned(),
            );
        }

        request
    }
}
