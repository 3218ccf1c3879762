//! Test support for `clusterside`: a config builder, a scripted process
//! backend and a status reporter that records every call.

pub mod builders;
pub mod fake_process;
pub mod recording_reporter;

pub use builders::JobConfigBuilder;
pub use fake_process::FakeProcessBackend;
pub use recording_reporter::{RecordingReporter, ReportEvent};

use tracing_subscriber::{EnvFilter, fmt};

/// Send crate logs to the test writer, so they show up only for failing
/// tests (or with `--nocapture`).
///
/// `CLUSTERSIDE_LOG` takes `EnvFilter` directives; the default is
/// `clusterside=debug` with everything else at `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("CLUSTERSIDE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,clusterside=debug"));

    // Called by every test; the first call installs the subscriber.
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}
