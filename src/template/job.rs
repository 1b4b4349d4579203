use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::constants::{markers, suffixes};
use crate::error::{Error, Result};
use crate::ext::PathExt;

/// The two families of template inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// `foo.xml.in` renders to `foo.xml`.
    DotIn,
    /// `foo.template` renders to an explicitly given path.
    Template,
}

impl JobKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            JobKind::DotIn => suffixes::DOT_IN,
            JobKind::Template => suffixes::TEMPLATE,
        }
    }

    fn check_suffix(&self, input: &Path) -> Result<()> {
        match input.strip_str_suffix(self.suffix()) {
            Some(_) => Ok(()),
            None => Err(Error::NamingConventionError {
                path: input.display().to_string(),
                expected_suffix: self.suffix().to_string(),
            }),
        }
    }
}

impl Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobKind::DotIn => "in",
            JobKind::Template => "template",
        };
        write!(f, "{s}")
    }
}

/// One unit of rendering work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateJob {
    pub kind: JobKind,
    pub input: PathBuf,
    pub output: PathBuf,
    pub marker: String,
    pub create_missing_dirs: bool,
}

impl TemplateJob {
    /// A `.in` job; the output path is the input path without `.in`.
    ///
    /// Fails with `NamingConventionError` before touching the filesystem if
    /// `input` lacks the suffix.
    pub fn dot_in<P: AsRef<Path>>(input: P) -> Result<Self> {
        let input = input.as_ref();
        JobKind::DotIn.check_suffix(input)?;
        let output = input.strip_str_suffix(suffixes::DOT_IN).unwrap_or_default();
        Ok(Self {
            kind: JobKind::DotIn,
            input: input.to_path_buf(),
            output,
            marker: markers::DEFAULT.to_string(),
            create_missing_dirs: false,
        })
    }

    /// A `.template` job rendering to `output`.
    pub fn template<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<Self> {
        let input = input.as_ref();
        JobKind::Template.check_suffix(input)?;
        Ok(Self {
            kind: JobKind::Template,
            input: input.to_path_buf(),
            output: output.as_ref().to_path_buf(),
            marker: markers::DEFAULT.to_string(),
            create_missing_dirs: false,
        })
    }

    pub fn with_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_create_missing_dirs(mut self, create_missing_dirs: bool) -> Self {
        self.create_missing_dirs = create_missing_dirs;
        self
    }
}
