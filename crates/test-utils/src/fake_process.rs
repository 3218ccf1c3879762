use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use clusterside::errors::{ClustersideError, Result};
use clusterside::exec::{ProcessBackend, ProcessOutput, ProcessRequest};

#[derive(Debug, Clone)]
enum Script {
    Output(ProcessOutput),
    Missing,
}

#[derive(Debug, Default)]
struct State {
    scripts: HashMap<String, Script>,
    requests: Vec<ProcessRequest>,
}

/// A fake process backend that:
/// - records every request it receives
/// - answers each program with a scripted output (exit 0 and no output
///   for programs that were not scripted)
/// - can pretend a program is not installed.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessBackend {
    state: Arc<Mutex<State>>,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, program: &str, code: i32, stdout: &str, stderr: &str) {
        let output = ProcessOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        };
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(program.to_string(), Script::Output(output));
    }

    /// Make `program` fail to start, as if it were not on `PATH`.
    pub fn missing(&self, program: &str) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(program.to_string(), Script::Missing);
    }

    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Requests made for `program`, in order.
    pub fn requests_for(&self, program: &str) -> Vec<ProcessRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.program == program)
            .collect()
    }
}

impl ProcessBackend for FakeProcessBackend {
    async fn run(&self, request: ProcessRequest) -> Result<ProcessOutput> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.scripts.get(&request.program).cloned()
        };

        match script {
            Some(Script::Output(output)) => Ok(output),
            Some(Script::Missing) => Err(ClustersideError::ProcessInvocation {
                program: request.program,
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            }),
            None => Ok(ProcessOutput {
                code: Some(0),
                ..ProcessOutput::default()
            }),
        }
    }
}
