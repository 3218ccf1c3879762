// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` trait and the
//!   `RealProcessBackend` built on `tokio::process`, which tests replace
//!   with a scripted fake.
//! - [`container`] builds the container runtime invocation for a run.
//! - [`executor`] drives one run end to end and reports its outcome.

pub mod backend;
pub mod container;
pub mod executor;

pub use backend::{ProcessBackend, ProcessOutput, ProcessRequest, RealProcessBackend};
pub use container::ContainerRuntime;
pub use executor::{Executor, RunOutcome};
