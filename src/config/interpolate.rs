//! Reference expansion inside configuration values.
//!
//! Both `${NAME}` and the `ConfigParser` form `%(NAME)s` are understood.
//! `$$` and `%%` produce a literal `$` and `%`.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::constants::MAX_INTERPOLATION_DEPTH;
use crate::error::{Error, Result};

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<brace>[^}]+)\}|%\((?P<paren>[^)]+)\)s|(?P<escape>\$\$|%%)").unwrap()
});

/// Names visible while expanding a value; later scopes shadow earlier ones.
pub struct Interpolator<'a> {
    source_name: &'a str,
    scope: IndexMap<&'a str, &'a str>,
}

impl<'a> Interpolator<'a> {
    pub fn new(source_name: &'a str) -> Self {
        Self { source_name, scope: IndexMap::new() }
    }

    pub fn with_scope<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.scope.extend(entries);
        self
    }

    /// Expands every reference in the raw value of `key`.
    pub fn expand(&self, key: &str, raw: &str) -> Result<String> {
        self.expand_at(key, raw, 1)
    }

    fn expand_at(&self, key: &str, raw: &str, depth: usize) -> Result<String> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(Error::config(
                self.source_name,
                format!("value of '{key}' exceeds the interpolation depth of {MAX_INTERPOLATION_DEPTH}"),
            ));
        }

        let mut out = String::with_capacity(raw.len());
        let mut last = 0;
        for caps in REFERENCE_RE.captures_iter(raw) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&raw[last..whole.start()]);
            last = whole.end();

            if let Some(escape) = caps.name("escape") {
                out.push_str(&escape.as_str()[..1]);
                continue;
            }

            let name = caps
                .name("brace")
                .or_else(|| caps.name("paren"))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let Some(value) = self.scope.get(name) else {
                return Err(Error::config(
                    self.source_name,
                    format!("value of '{key}' references undefined name '{name}'"),
                ));
            };
            out.push_str(&self.expand_at(name, value, depth + 1)?);
        }
        out.push_str(&raw[last..]);

        Ok(out)
    }
}
