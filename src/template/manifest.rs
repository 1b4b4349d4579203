//! Job manifest loading

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::constants::{markers, MANIFEST_FILENAMES};
use crate::error::{Error, Result};
use crate::template::job::TemplateJob;

fn default_marker() -> String {
    markers::DEFAULT.to_string()
}

/// A `.in` entry: either a bare path or a table with options.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DotInEntry {
    Path(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default = "default_marker")]
        marker: String,
        #[serde(default)]
        create_missing_dirs: bool,
    },
}

/// A `.template` entry: either the output path or a table with options.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TemplateEntry {
    Output(PathBuf),
    Detailed {
        output: PathBuf,
        #[serde(default = "default_marker")]
        marker: String,
        #[serde(default)]
        create_missing_dirs: bool,
    },
}

/// The jobs to run, in order: every `dot_ins` entry, then every `templates` entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct JobManifest {
    #[serde(default)]
    pub dot_ins: Vec<DotInEntry>,
    #[serde(default)]
    pub templates: IndexMap<PathBuf, TemplateEntry>,
}

impl JobManifest {
    /// The Android services job list used when no manifest file exists.
    pub fn builtin() -> Self {
        let detailed = |path: &str, marker: &str, create_missing_dirs| DotInEntry::Detailed {
            path: PathBuf::from(path),
            marker: marker.to_string(),
            create_missing_dirs,
        };
        Self {
            dot_ins: vec![
                detailed("src/main/java/org/mozilla/gecko/AppConstants.java.in", markers::JAVA, true),
                DotInEntry::Path("AndroidManifest.xml.in".into()),
                DotInEntry::Path("test/AndroidManifest.xml.in".into()),
                DotInEntry::Path("README.rst.in".into()),
            ],
            templates: IndexMap::from([(
                PathBuf::from("strings/strings.xml.template"),
                TemplateEntry::Output("res/values/strings.xml".into()),
            )]),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFoundError {
                path: path.to_path_buf(),
                reason: "Job manifest does not exist.".to_string(),
            },
            _ => Error::IoError(e),
        })?;

        let manifest = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::config(&source, e.to_string()))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| Error::config(&source, e.to_string()))?,
        };
        log::debug!("Loaded job manifest '{source}'");
        Ok(manifest)
    }

    /// Loads `explicit` if given, else the first manifest found in `root`,
    /// else the built-in job list.
    pub fn discover<P: AsRef<Path>>(root: P, explicit: Option<&Path>) -> Result<Self> {
        let root = root.as_ref();
        if let Some(path) = explicit {
            return Self::from_file(root.join(path));
        }
        for file_name in MANIFEST_FILENAMES {
            let candidate = root.join(file_name);
            if candidate.is_file() {
                return Self::from_file(candidate);
            }
        }
        log::debug!("No job manifest in '{}', using the built-in job list", root.display());
        Ok(Self::builtin())
    }

    /// Validates naming conventions and builds the ordered job list.
    pub fn jobs(&self) -> Result<Vec<TemplateJob>> {
        let dot_ins = self.dot_ins.iter().map(|entry| match entry {
            DotInEntry::Path(path) => TemplateJob::dot_in(path),
            DotInEntry::Detailed { path, marker, create_missing_dirs } => {
                Ok(TemplateJob::dot_in(path)?
                    .with_marker(marker.as_str())
                    .with_create_missing_dirs(*create_missing_dirs))
            }
        });
        let templates = self.templates.iter().map(|(input, entry)| match entry {
            TemplateEntry::Output(output) => TemplateJob::template(input, output),
            TemplateEntry::Detailed { output, marker, create_missing_dirs } => {
                Ok(TemplateJob::template(input, output)?
                    .with_marker(marker.as_str())
                    .with_create_missing_dirs(*create_missing_dirs))
            }
        });
        dot_ins.chain(templates).collect()
    }
}
