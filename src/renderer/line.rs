use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use regex::Regex;

use super::directive::Directive;
use super::filters::Filter;
use super::interface::Preprocessor;
use crate::config::Defines;
use crate::constants::MAX_INCLUDE_DEPTH;
use crate::error::{Error, Result};

/// Line terminator written after every output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// State of one open `if`/`ifdef`/`ifndef` block.
#[derive(Debug)]
struct Branch {
    opened_at: usize,
    parent_active: bool,
    taken: bool,
    active: bool,
    seen_else: bool,
}

/// Preprocessor driven by marker-prefixed directive lines.
///
/// A directive line is the marker immediately followed by a command word,
/// e.g. `#ifdef NAME` or `//#define NAME value`. Everything else is content,
/// which passes through the active filters when it sits in an active block.
#[derive(Debug)]
pub struct LinePreprocessor {
    context: BTreeMap<String, String>,
    marker: String,
    directive_re: Regex,
    line_ending: LineEnding,
    filters: BTreeSet<Filter>,
    include_depth: usize,
}

impl LinePreprocessor {
    pub fn new(defines: &Defines, marker: &str) -> Result<Self> {
        if marker.is_empty() {
            return Err(Error::Other(anyhow::anyhow!("directive marker must not be empty")));
        }
        let pattern = format!(
            r"^\s*{}(?P<command>[A-Za-z]+)(?:\s+(?P<args>.*?))?\s*$",
            regex::escape(marker)
        );
        let directive_re = Regex::new(&pattern).map_err(anyhow::Error::from)?;

        Ok(Self {
            context: defines.clone().into_inner(),
            marker: marker.to_string(),
            directive_re,
            line_ending: LineEnding::default(),
            filters: BTreeSet::new(),
            include_depth: 0,
        })
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_filters<I: IntoIterator<Item = Filter>>(mut self, filters: I) -> Self {
        self.filters.extend(filters);
        self
    }

    fn process_file(&mut self, input: &Path, out: &mut dyn Write) -> Result<()> {
        let bytes = match fs::read(input) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFoundError {
                    path: input.to_path_buf(),
                    reason: "Input template does not exist.".to_string(),
                })
            }
            Err(e) => return Err(Error::IoError(e)),
        };
        let file_name = input.display().to_string();
        let syntax_error = |line: usize, message: String| Error::DirectiveSyntaxError {
            file: file_name.clone(),
            line,
            message,
        };
        // Templates must be UTF-8; report where decoding stopped.
        let text = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            syntax_error(line, "template is not valid UTF-8".to_string())
        })?;

        let mut stack: Vec<Branch> = Vec::new();

        for (index, raw) in text.split_inclusive('\n').enumerate() {
            let line_no = index + 1;
            let (line, terminated) = split_terminator(raw);
            let active = stack.last().map_or(true, |b| b.active);

            let Some(caps) = self.directive_re.captures(line) else {
                if active {
                    let filtered =
                        self.filter_line(line).map_err(|msg| syntax_error(line_no, msg))?;
                    if let Some(text) = filtered {
                        self.write_line(&text, terminated, out)?;
                    }
                }
                continue;
            };

            let command = caps.name("command").map_or("", |m| m.as_str());
            let args = caps.name("args").map_or("", |m| m.as_str());
            let directive = Directive::parse(command, args)
                .map_err(|msg| syntax_error(line_no, format!("{}{command}: {msg}", self.marker)))?;

            if !active && !directive.is_conditional() {
                continue;
            }

            match directive {
                Directive::Ifdef(name) => {
                    let value = self.context.contains_key(name);
                    open_branch(&mut stack, line_no, value);
                }
                Directive::Ifndef(name) => {
                    let value = !self.context.contains_key(name);
                    open_branch(&mut stack, line_no, value);
                }
                Directive::If(condition) => {
                    let value = condition.evaluate(&self.context);
                    open_branch(&mut stack, line_no, value);
                }
                Directive::Elifdef(name) => {
                    let value = self.context.contains_key(name);
                    continue_branch(&mut stack, value, false)
                        .map_err(|msg| syntax_error(line_no, msg))?;
                }
                Directive::Elifndef(name) => {
                    let value = !self.context.contains_key(name);
                    continue_branch(&mut stack, value, false)
                        .map_err(|msg| syntax_error(line_no, msg))?;
                }
                Directive::Elif(condition) => {
                    let value = condition.evaluate(&self.context);
                    continue_branch(&mut stack, value, false)
                        .map_err(|msg| syntax_error(line_no, msg))?;
                }
                Directive::Else => {
                    continue_branch(&mut stack, true, true)
                        .map_err(|msg| syntax_error(line_no, msg))?;
                }
                Directive::Endif => {
                    if stack.pop().is_none() {
                        return Err(syntax_error(
                            line_no,
                            format!("{}endif without matching if", self.marker),
                        ));
                    }
                }
                Directive::Define { name, value } => {
                    self.context.insert(name.to_string(), value.to_string());
                }
                Directive::Undef(name) => {
                    self.context.remove(name);
                }
                Directive::Filter(filters) => self.filters.extend(filters),
                Directive::Unfilter(filters) => {
                    for filter in filters {
                        self.filters.remove(&filter);
                    }
                }
                Directive::Include(target) => {
                    let path = resolve_include(input, target);
                    self.include_nested(&path, out)
                        .map_err(|e| match e {
                            Error::NotFoundError { path, .. } => syntax_error(
                                line_no,
                                format!("cannot include '{}': file not found", path.display()),
                            ),
                            other => other,
                        })?;
                }
                Directive::Literal(text) => self.write_line(text, terminated, out)?,
                Directive::Error(message) => {
                    return Err(syntax_error(line_no, format!("error directive: {message}")));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(syntax_error(
                open.opened_at,
                format!("unterminated conditional block, missing {}endif", self.marker),
            ));
        }

        Ok(())
    }

    /// Runs the active filters over `line`; `None` if a filter dropped it.
    fn filter_line(&self, line: &str) -> std::result::Result<Option<String>, String> {
        let mut current = Some(line.to_string());
        for filter in &self.filters {
            let Some(text) = current.take() else { break };
            current = filter.apply(text, &self.context)?;
        }
        Ok(current)
    }

    /// Writes `text`, followed by the configured line ending only if the
    /// source line had a terminator.
    fn write_line(&self, text: &str, terminated: bool, out: &mut dyn Write) -> Result<()> {
        out.write_all(text.as_bytes())?;
        if terminated {
            out.write_all(self.line_ending.as_str().as_bytes())?;
        }
        Ok(())
    }

    fn include_nested(&mut self, path: &Path, out: &mut dyn Write) -> Result<()> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::DirectiveSyntaxError {
                file: path.display().to_string(),
                line: 0,
                message: format!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels"),
            });
        }
        self.include_depth += 1;
        let result = self.process_file(path, out);
        self.include_depth -= 1;
        result
    }
}

impl Preprocessor for LinePreprocessor {
    fn include(&mut self, input: &Path, out: &mut dyn Write) -> Result<()> {
        log::trace!("Preprocessing '{}' with marker '{}'", input.display(), self.marker);
        self.process_file(input, out)
    }
}

/// Splits a line produced by `split_inclusive` into its text and whether it
/// ended with `\n` or `\r\n`.
fn split_terminator(raw: &str) -> (&str, bool) {
    match raw.strip_suffix('\n') {
        Some(line) => (line.strip_suffix('\r').unwrap_or(line), true),
        None => (raw, false),
    }
}

fn open_branch(stack: &mut Vec<Branch>, line_no: usize, value: bool) {
    let parent_active = stack.last().map_or(true, |b| b.active);
    let active = parent_active && value;
    stack.push(Branch { opened_at: line_no, parent_active, taken: active, active, seen_else: false });
}

fn continue_branch(
    stack: &mut [Branch],
    value: bool,
    is_else: bool,
) -> std::result::Result<(), String> {
    let Some(branch) = stack.last_mut() else {
        return Err(format!("{} without matching if", if is_else { "else" } else { "elif" }));
    };
    if branch.seen_else {
        return Err("branch after else".to_string());
    }
    branch.active = branch.parent_active && !branch.taken && value;
    branch.taken |= branch.active;
    branch.seen_else = is_else;
    Ok(())
}

fn resolve_include(current: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return target.to_path_buf();
    }
    current.parent().map(|dir| dir.join(target)).unwrap_or_else(|| target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defines(pairs: &[(&str, &str)]) -> Defines {
        pairs.iter().copied().collect()
    }

    fn render(marker: &str, pairs: &[(&str, &str)], input: &str) -> Result<String> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.in");
        fs::write(&path, input).unwrap();

        let mut engine = LinePreprocessor::new(&defines(pairs), marker)?
            .with_filters([Filter::Substitution]);
        let mut out = Vec::new();
        engine.include(&path, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn substitutes_definitions() {
        let out = render("#", &[("GREETING", "hi")], "Hello ${GREETING}!").unwrap();
        assert_eq!(out, "Hello hi!");
    }

    #[test]
    fn normalizes_line_endings_to_lf() {
        let out = render("#", &[], "a\r\nb\r\nc").unwrap();
        assert_eq!(out, "a\nb\nc");
    }

    #[test]
    fn crlf_policy_is_honored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.in");
        fs::write(&path, "a\nb\n").unwrap();

        let mut engine =
            LinePreprocessor::new(&Defines::new(), "#").unwrap().with_line_ending(LineEnding::CrLf);
        let mut out = Vec::new();
        engine.include(&path, &mut out).unwrap();
        assert_eq!(out, b"a\r\nb\r\n");
    }

    #[test]
    fn comments_and_shebangs_are_content() {
        let input = "#!/bin/sh\n# a comment\n#123\n";
        assert_eq!(render("#", &[], input).unwrap(), input);
    }

    #[test]
    fn conditional_blocks() {
        let input = "#ifdef A\na\n#elif B == x\nb\n#else\nc\n#endif\n";
        assert_eq!(render("#", &[("A", "1")], input).unwrap(), "a\n");
        assert_eq!(render("#", &[("B", "x")], input).unwrap(), "b\n");
        assert_eq!(render("#", &[], input).unwrap(), "c\n");
    }

    #[test]
    fn nested_blocks_inside_inactive_branch_stay_balanced() {
        let input = "#ifdef NOPE\n#ifdef ALSO\nx\n#endif\n#else\nkept\n#endif\n";
        assert_eq!(render("#", &[], input).unwrap(), "kept\n");
    }

    #[test]
    fn inactive_lines_are_not_substituted() {
        let input = "#ifdef NOPE\n${UNDEFINED}\n#endif\nok\n";
        assert_eq!(render("#", &[], input).unwrap(), "ok\n");
    }

    #[test]
    fn java_marker() {
        let input = "//#ifdef MOZ_UPDATER\nupdater();\n//#endif\nString pkg = \"${ANDROID_PACKAGE_NAME}\";\n";
        let out = render("//#", &[("ANDROID_PACKAGE_NAME", "org.mozilla.fennec")], input).unwrap();
        assert_eq!(out, "String pkg = \"org.mozilla.fennec\";\n");
    }

    #[test]
    fn hash_lines_are_content_with_java_marker() {
        let out = render("//#", &[], "#ifdef X\n").unwrap();
        assert_eq!(out, "#ifdef X\n");
    }

    #[test]
    fn define_and_undef_update_context() {
        let input = "#define NAME world\nhello ${NAME}\n#undef NAME\n#ifndef NAME\ngone\n#endif\n";
        assert_eq!(render("#", &[], input).unwrap(), "hello world\ngone\n");
    }

    #[test]
    fn literal_is_not_filtered() {
        assert_eq!(render("#", &[], "#literal ${RAW}\n").unwrap(), "${RAW}\n");
    }

    #[test]
    fn filter_and_unfilter() {
        let input = "#filter emptyLines\na\n\nb\n#unfilter emptyLines\n\n";
        assert_eq!(render("#", &[], input).unwrap(), "a\nb\n\n");
    }

    #[test]
    fn includes_relative_to_current_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("parts")).unwrap();
        fs::write(dir.path().join("parts/inner.txt"), "inner ${X}\n").unwrap();
        let path = dir.path().join("outer.in");
        fs::write(&path, "before\n#include parts/inner.txt\nafter\n").unwrap();

        let mut engine = LinePreprocessor::new(&defines(&[("X", "1")]), "#")
            .unwrap()
            .with_filters([Filter::Substitution]);
        let mut out = Vec::new();
        engine.include(&path, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "before\ninner 1\nafter\n");
    }

    #[test]
    fn include_cycle_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("self.in");
        fs::write(&path, "#include self.in\n").unwrap();

        let mut engine = LinePreprocessor::new(&Defines::new(), "#").unwrap();
        let err = engine.include(&path, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::DirectiveSyntaxError { .. }));
    }

    #[test]
    fn unbalanced_directives_are_errors() {
        for input in ["#endif\n", "#else\n", "#ifdef A\n", "#ifdef A\n#else\n#else\n#endif\n"] {
            let err = render("#", &[], input).unwrap_err();
            assert!(matches!(err, Error::DirectiveSyntaxError { .. }), "input: {input:?}");
        }
    }

    #[test]
    fn unterminated_block_reports_opening_line() {
        match render("#", &[], "a\n#ifdef A\nb\n").unwrap_err() {
            Error::DirectiveSyntaxError { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_directive_is_an_error() {
        let err = render("#", &[], "#frobnicate now\n").unwrap_err();
        assert!(err.to_string().contains("unknown directive"));
    }

    #[test]
    fn undefined_substitution_is_an_error() {
        match render("#", &[], "ok\n${MISSING}\n").unwrap_err() {
            Error::DirectiveSyntaxError { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("MISSING"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_directive_fails_only_when_active() {
        assert!(render("#", &[], "#ifdef NOPE\n#error boom\n#endif\n").is_ok());
        assert!(render("#", &[], "#error boom\n").is_err());
    }

    #[test]
    fn unterminated_last_line_stays_unterminated() {
        assert_eq!(render("#", &[], "a\nb").unwrap(), "a\nb");
        assert_eq!(render("#", &[], "a\nb\n").unwrap(), "a\nb\n");
        assert_eq!(render("#", &[], "").unwrap(), "");
        assert_eq!(render("#", &[], "#literal x").unwrap(), "x");
    }

    #[test]
    fn directive_on_unterminated_last_line_is_recognized() {
        assert_eq!(render("#", &[("A", "1")], "#ifdef A\nyes\n#endif").unwrap(), "yes\n");
    }

    #[test]
    fn non_utf8_template_reports_the_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.in");
        fs::write(&path, b"ok\ncaf\xe9\n").unwrap();

        let mut engine = LinePreprocessor::new(&Defines::new(), "#").unwrap();
        match engine.include(&path, &mut Vec::new()).unwrap_err() {
            Error::DirectiveSyntaxError { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_input_is_not_found() {
        let mut engine = LinePreprocessor::new(&Defines::new(), "#").unwrap();
        let err = engine.include(Path::new("/definitely/not/here.in"), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::NotFoundError { .. }));
    }
}
