//! INI configuration sources
//!
//! The grammar is the one Python's `ConfigParser` accepts, with key case
//! preserved: `[section]` headers, `key = value` or `key: value` options,
//! `#`/`;` comment lines and indented continuation lines.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, Result};

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(?P<name>[^\]]+)\]\s*$").unwrap());

static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>[^:=\s][^:=]*?)\s*[:=]\s*(?P<value>.*?)\s*$").unwrap()
});

/// Options of one section, in file order.
pub type Section = IndexMap<String, String>;

/// Raw, uninterpolated content of one or more INI sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: IndexMap<String, Section>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses INI text. `source_name` is only used in error messages.
    pub fn parse(source_name: &str, text: &str) -> Result<Self> {
        let mut doc = Self::new();
        let mut current_section: Option<String> = None;
        let mut current_key: Option<String> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim_end_matches('\r');

            if line.trim().is_empty() || line.starts_with(['#', ';']) {
                continue;
            }

            if line.starts_with([' ', '\t']) {
                // Continuation of the previous value.
                match (&current_section, &current_key) {
                    (Some(section), Some(key)) => {
                        if let Some(value) =
                            doc.sections.get_mut(section).and_then(|s| s.get_mut(key))
                        {
                            value.push('\n');
                            value.push_str(line.trim());
                        }
                        continue;
                    }
                    _ => {
                        return Err(Error::config(
                            source_name,
                            format!("line {line_no}: continuation line without an option"),
                        ))
                    }
                }
            }

            if let Some(caps) = SECTION_RE.captures(line) {
                let name = caps["name"].to_string();
                doc.sections.entry(name.clone()).or_default();
                current_section = Some(name);
                current_key = None;
                continue;
            }

            let Some(caps) = OPTION_RE.captures(line) else {
                return Err(Error::config(
                    source_name,
                    format!("line {line_no}: cannot parse '{line}'"),
                ));
            };

            let Some(section) = &current_section else {
                return Err(Error::config(
                    source_name,
                    format!("line {line_no}: option outside of any section"),
                ));
            };

            let key = caps["key"].to_string();
            let value = caps["value"].to_string();
            doc.sections.entry(section.clone()).or_default().insert(key.clone(), value);
            current_key = Some(key);
        }

        Ok(doc)
    }

    /// Reads and merges `paths` in order, skipping files that do not exist.
    ///
    /// Returns the merged document and the files that were actually read.
    pub fn read_files<P: AsRef<Path>>(paths: &[P]) -> Result<(Self, Vec<PathBuf>)> {
        let mut doc = Self::new();
        let mut loaded = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::debug!("Configuration '{}' does not exist, skipping", path.display());
                    continue;
                }
                Err(e) => return Err(Error::IoError(e)),
            };
            log::debug!("Reading configuration '{}'", path.display());
            doc.merge(Self::parse(&path.display().to_string(), &text)?);
            loaded.push(path.to_path_buf());
        }

        Ok((doc, loaded))
    }

    /// Overlays `other` on top of `self`; options in `other` win.
    pub fn merge(&mut self, other: IniDocument) {
        for (name, options) in other.sections {
            self.sections.entry(name).or_default().extend(options);
        }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key).map(String::as_str)
    }
}
