//! Line-directive preprocessing engine
//!
//! - `interface`: The [`Preprocessor`] seam the driver depends on
//! - `directive`: Parsing of directive lines and `#if` conditions
//! - `filters`: Per-line content filters (`substitution`, ...)
//! - `line`: [`LinePreprocessor`], the engine implementation

pub mod directive;
pub mod filters;
pub mod interface;
pub mod line;

pub use filters::Filter;
pub use interface::Preprocessor;
pub use line::{LineEnding, LinePreprocessor};
