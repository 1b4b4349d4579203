use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::filters::Filter;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());

static DEFINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>\w+)(?:\s+(?P<value>.*))?$").unwrap());

static COMPARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>\w+)\s*(?P<op>==|!=)\s*(?P<value>.*?)$").unwrap()
});

/// Condition of an `if` or `elif` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition<'a> {
    /// `NAME` or `!NAME`: defined, non-empty and not `0`.
    Truthy { name: &'a str, negated: bool },
    /// `NAME == VALUE` or `NAME != VALUE`.
    Compare { name: &'a str, value: &'a str, equal: bool },
}

impl<'a> Condition<'a> {
    pub fn parse(expr: &'a str) -> Result<Self, String> {
        let expr = expr.trim();
        if let Some(caps) = COMPARE_RE.captures(expr) {
            let (Some(name), Some(op), Some(value)) =
                (caps.name("name"), caps.name("op"), caps.name("value"))
            else {
                return Err(format!("malformed condition '{expr}'"));
            };
            return Ok(Condition::Compare {
                name: name.as_str(),
                value: value.as_str(),
                equal: op.as_str() == "==",
            });
        }

        let (name, negated) = match expr.strip_prefix('!') {
            Some(rest) => (rest.trim_start(), true),
            None => (expr, false),
        };
        if !NAME_RE.is_match(name) {
            return Err(format!("malformed condition '{expr}'"));
        }
        Ok(Condition::Truthy { name, negated })
    }

    pub fn evaluate(&self, context: &BTreeMap<String, String>) -> bool {
        match self {
            Condition::Truthy { name, negated } => {
                let truthy = context
                    .get(*name)
                    .is_some_and(|value| !value.is_empty() && value != "0");
                truthy != *negated
            }
            Condition::Compare { name, value, equal } => {
                let matches = context.get(*name).is_some_and(|v| v == value);
                matches == *equal
            }
        }
    }
}

/// A parsed directive line, borrowing from the line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    Define { name: &'a str, value: &'a str },
    Undef(&'a str),
    Ifdef(&'a str),
    Ifndef(&'a str),
    If(Condition<'a>),
    Elifdef(&'a str),
    Elifndef(&'a str),
    Elif(Condition<'a>),
    Else,
    Endif,
    Filter(Vec<Filter>),
    Unfilter(Vec<Filter>),
    Include(&'a str),
    Literal(&'a str),
    Error(&'a str),
}

impl<'a> Directive<'a> {
    /// Builds a directive from its command word and the (trimmed) rest of the line.
    pub fn parse(command: &str, args: &'a str) -> Result<Self, String> {
        let directive = match command {
            "define" => {
                let caps = DEFINE_RE
                    .captures(args)
                    .ok_or_else(|| format!("malformed define '{args}'"))?;
                let name = caps.name("name").map_or("", |m| m.as_str());
                // A bare `define NAME` defines it as 1.
                let value = caps.name("value").map_or("1", |m| m.as_str());
                Directive::Define { name, value }
            }
            "undef" => Directive::Undef(name_arg(command, args)?),
            "ifdef" => Directive::Ifdef(name_arg(command, args)?),
            "ifndef" => Directive::Ifndef(name_arg(command, args)?),
            "if" => Directive::If(Condition::parse(args)?),
            "elifdef" => Directive::Elifdef(name_arg(command, args)?),
            "elifndef" => Directive::Elifndef(name_arg(command, args)?),
            "elif" => Directive::Elif(Condition::parse(args)?),
            "else" => {
                no_args(command, args)?;
                Directive::Else
            }
            "endif" => {
                no_args(command, args)?;
                Directive::Endif
            }
            "filter" => Directive::Filter(filter_args(command, args)?),
            "unfilter" => Directive::Unfilter(filter_args(command, args)?),
            "include" => {
                if args.is_empty() {
                    return Err("include requires a file name".to_string());
                }
                Directive::Include(args)
            }
            "literal" => Directive::Literal(args),
            "error" => Directive::Error(args),
            other => return Err(format!("unknown directive '{other}'")),
        };
        Ok(directive)
    }

    /// Whether the directive opens, continues or closes a conditional block.
    ///
    /// These are processed even inside inactive blocks so nesting stays balanced.
    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            Directive::Ifdef(_)
                | Directive::Ifndef(_)
                | Directive::If(_)
                | Directive::Elifdef(_)
                | Directive::Elifndef(_)
                | Directive::Elif(_)
                | Directive::Else
                | Directive::Endif
        )
    }
}

fn name_arg<'a>(command: &str, args: &'a str) -> Result<&'a str, String> {
    if NAME_RE.is_match(args) {
        Ok(args)
    } else {
        Err(format!("{command} expects a single name, got '{args}'"))
    }
}

fn no_args(command: &str, args: &str) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("{command} takes no arguments, got '{args}'"))
    }
}

fn filter_args(command: &str, args: &str) -> Result<Vec<Filter>, String> {
    let filters = args
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<Filter>, String>>()?;
    if filters.is_empty() {
        return Err(format!("{command} requires at least one filter name"));
    }
    Ok(filters)
}
