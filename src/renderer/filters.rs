use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static SUBSTITUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(?P<name>\w+)\}").unwrap());

static SLASHSLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*//.*$").unwrap());

/// Content filters, applied to every non-directive line in name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Filter {
    /// Drops lines that are empty or whitespace only.
    EmptyLines,
    /// Strips `//` comments to the end of the line.
    SlashSlash,
    /// Replaces `${NAME}` with the value of the definition `NAME`.
    Substitution,
}

impl Filter {
    /// Returns the filtered line, or `None` if the line is dropped.
    ///
    /// The error is a message suitable for a directive syntax error.
    pub fn apply(
        &self,
        line: String,
        context: &BTreeMap<String, String>,
    ) -> Result<Option<String>, String> {
        match self {
            Filter::EmptyLines => {
                Ok(if line.trim().is_empty() { None } else { Some(line) })
            }
            Filter::SlashSlash => Ok(Some(SLASHSLASH_RE.replace(&line, "").into_owned())),
            Filter::Substitution => substitute(&line, context).map(Some),
        }
    }
}

fn substitute(line: &str, context: &BTreeMap<String, String>) -> Result<String, String> {
    let mut undefined = None;
    let replaced = SUBSTITUTION_RE.replace_all(line, |caps: &Captures| {
        let name = &caps["name"];
        match context.get(name) {
            Some(value) => value.clone(),
            None => {
                undefined.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match undefined {
        Some(name) => Err(format!("variable '{name}' is not defined")),
        None => Ok(replaced.into_owned()),
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emptyLines" => Ok(Filter::EmptyLines),
            "slashslash" => Ok(Filter::SlashSlash),
            "substitution" => Ok(Filter::Substitution),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Filter::EmptyLines => "emptyLines",
            Filter::SlashSlash => "slashslash",
            Filter::Substitution => "substitution",
        };
        write!(f, "{s}")
    }
}
