// src/config/mod.rs

//! Job configuration loading and validation for clusterside.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Load a job config artifact from disk (`loader.rs`).
//! - Validate field shapes and bindings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{Binding, JobConfig, Param, RawBinding, RawJobConfig, RawParam, RawParameters};
