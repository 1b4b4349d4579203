/// Handles argument parsing and the top-level run.
pub mod cli;

/// Defines custom error types.
pub mod error;

/// Constants shared across modules.
pub mod constants;

/// Definition table construction from INI sources.
pub mod config;

/// Line-directive preprocessing engine.
pub mod renderer;

/// A set of helpers for working with the file system.
pub mod ioutils;

/// Template jobs and the rendering driver.
pub mod template;

/// Extension traits for standard library types.
pub mod ext;
