use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Trait for line-directive preprocessing engines.
pub trait Preprocessor {
    /// Processes `input` line by line, writing the rendered lines to `out`.
    ///
    /// # Arguments
    /// * `input` - Template file to read
    /// * `out` - Destination for rendered output
    ///
    /// # Returns
    /// * `Result<()>` - `NotFoundError` if `input` does not exist,
    ///   `DirectiveSyntaxError` for malformed directives or failed substitutions
    fn include(&mut self, input: &Path, out: &mut dyn Write) -> Result<()>;
}
