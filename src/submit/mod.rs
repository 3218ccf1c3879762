// src/submit/mod.rs

//! The queue path: render the submission script and hand it to the batch
//! scheduler.

pub mod bridge;
pub mod template;

pub use bridge::{SubmissionBridge, SubmitOutcome};
pub use template::render;
