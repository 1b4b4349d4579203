//! Template processing for the preprocessor
//!
//! This module contains the job-level components:
//! - `job`: Template jobs and their file naming conventions
//! - `manifest`: Loading the list of jobs to run
//! - `processor`: Rendering one job through the engine into a write-avoiding sink

pub mod job;
pub mod manifest;
pub mod processor;

pub use job::{JobKind, TemplateJob};
pub use manifest::JobManifest;
pub use processor::{render, TemplateProcessor};
