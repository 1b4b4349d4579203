use std::collections::BTreeMap;
use std::path::Path;

use crate::config::context::InterpolationContext;
use crate::config::ini::IniDocument;
use crate::config::interpolate::Interpolator;
use crate::constants::{sections, synthetic};
use crate::error::{Error, Result};

/// Preprocessor definitions: case-sensitive name to replacement text.
///
/// Iterates in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defines(BTreeMap<String, String>);

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Definitions in `other` replace those with the same name.
    ///
    /// Both tables are already interpolated, so a value that referenced an
    /// overridden name keeps its old expansion. Overriding sources that must
    /// affect such references are merged as raw documents with
    /// [`IniDocument::merge`] before interpolation, which is what
    /// [`build_definitions`] does.
    pub fn overlay(&mut self, other: &Defines) {
        self.0.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Defines {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Reads `config_sources` in order and returns the `[defines]` table.
///
/// Later sources override earlier ones. Sources that do not exist are
/// skipped. Values may reference other definitions, `[DEFAULT]` values and
/// the `USERNAME`/`TIMESTAMP` values of `context`; none of the latter appear
/// in the result.
pub fn build_definitions<P: AsRef<Path>>(
    config_sources: &[P],
    context: &InterpolationContext,
) -> Result<Defines> {
    let (doc, loaded) = IniDocument::read_files(config_sources)?;
    let source_name = loaded
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    definitions_from_document(&doc, &source_name, context)
}

/// Extracts and interpolates the `[defines]` section of an already merged document.
pub fn definitions_from_document(
    doc: &IniDocument,
    source_name: &str,
    context: &InterpolationContext,
) -> Result<Defines> {
    let source_name = if source_name.is_empty() { "<no configuration>" } else { source_name };

    let Some(defines) = doc.section(sections::DEFINES) else {
        return Err(Error::config(
            source_name,
            format!("no [{}] section found", sections::DEFINES),
        ));
    };

    let synthetic_values = context.pairs();
    let defaults = doc.section(sections::DEFAULT);

    let interpolator = Interpolator::new(source_name)
        .with_scope(synthetic_values.iter().map(|(k, v)| (*k, v.as_str())))
        .with_scope(
            defaults
                .into_iter()
                .flatten()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .with_scope(defines.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let mut table = Defines::new();
    for (key, raw) in defines {
        if synthetic::ALL.contains(&key.as_str()) {
            continue;
        }
        table.0.insert(key.clone(), interpolator.expand(key, raw)?);
    }

    log::debug!("Built {} definitions from {source_name}", table.len());
    Ok(table)
}
