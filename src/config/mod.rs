//! Preprocessor definition handling
//!
//! This module contains the configuration system components:
//! - `context`: Read-only values available for interpolation only
//! - `ini`: INI source parsing and raw, ordered merging
//! - `interpolate`: `${NAME}` / `%(NAME)s` expansion inside configuration values
//! - `defines`: The definition table handed to the substitution engine

pub mod context;
pub mod defines;
pub mod ini;
pub mod interpolate;


pub use context::InterpolationContext;
pub use defines::{build_definitions, Defines};
pub use ini::{IniDocument, Section};
