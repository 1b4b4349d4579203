use std::path::PathBuf;
use thiserror::Error;

use crate::constants::exit_codes;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    /// A configuration source or job manifest is malformed, or the
    /// `[defines]` section is absent.
    #[error("Configuration error in '{source_path}': {message}.")]
    ConfigError { source_path: String, message: String },

    /// A template input does not carry the suffix its job family requires.
    #[error("Filename '{path}' should end in '{expected_suffix}'.")]
    NamingConventionError { path: String, expected_suffix: String },

    /// Input template missing, or its destination directory cannot be created.
    #[error("Cannot proceed: '{}' not found. {reason}", path.display())]
    NotFoundError { path: PathBuf, reason: String },

    /// Raised by the line preprocessor and propagated unmodified.
    #[error("{file}:{line}: {message}")]
    DirectiveSyntaxError { file: String, line: usize, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn config<S: Into<String>, M: Into<String>>(source_path: S, message: M) -> Self {
        Error::ConfigError { source_path: source_path.into(), message: message.into() }
    }
}

/// Convenience type alias for Results with the crate error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// Every error is fatal for the run, so this always exits with
/// [`exit_codes::FAILURE`].
pub fn default_error_handler(err: Error) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(exit_codes::FAILURE);
}
