use std::path::{Path, PathBuf};

use crate::config::Defines;
use crate::error::{Error, Result};
use crate::ioutils::{create_dir_all, AvoidWriteFile, WriteOutcome};
use crate::renderer::{Filter, LineEnding, LinePreprocessor, Preprocessor};

use super::job::TemplateJob;

/// Renders template jobs against one definition table.
pub struct TemplateProcessor<'a> {
    defines: &'a Defines,
    /// Job paths are relative to this directory.
    root: PathBuf,
    dry_run: bool,
}

impl<'a> TemplateProcessor<'a> {
    pub fn new<P: AsRef<Path>>(defines: &'a Defines, root: P) -> Self {
        Self { defines, root: root.as_ref().to_path_buf(), dry_run: false }
    }

    /// Compare outputs without writing them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Renders one job. Jobs are independent: nothing is rolled back if a
    /// later job fails.
    pub fn process(&self, job: &TemplateJob) -> Result<WriteOutcome> {
        log::debug!(
            "Rendering {} job '{}' -> '{}'",
            job.kind,
            job.input.display(),
            job.output.display()
        );
        self.render(
            self.root.join(&job.input),
            self.root.join(&job.output),
            job.create_missing_dirs,
            &job.marker,
        )
    }

    /// Renders `input` into `output` with the `substitution` filter active and
    /// LF line endings.
    ///
    /// The output only changes on disk if the rendered bytes differ from what
    /// is already there. A missing input fails with `NotFoundError` before
    /// anything is created; directive errors from the engine are returned as is.
    pub fn render<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        create_missing_dirs: bool,
        marker: &str,
    ) -> Result<WriteOutcome> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.is_file() {
            return Err(Error::NotFoundError {
                path: input.to_path_buf(),
                reason: "Input template does not exist.".to_string(),
            });
        }

        let mut engine = LinePreprocessor::new(self.defines, marker)?
            .with_line_ending(LineEnding::Lf)
            .with_filters([Filter::Substitution]);

        if create_missing_dirs && !self.dry_run {
            if let Some(parent) = output.parent() {
                create_dir_all(parent)?;
            }
        }

        let mut sink = if self.dry_run {
            AvoidWriteFile::dry_run(output)
        } else {
            AvoidWriteFile::new(output)
        };
        engine.include(input, &mut sink)?;
        sink.finalize()
    }
}

/// Renders a single template relative to the current directory.
pub fn render<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    defines: &Defines,
    create_missing_dirs: bool,
    marker: &str,
) -> Result<WriteOutcome> {
    TemplateProcessor::new(defines, "").render(input, output, create_missing_dirs, marker)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::ioutils::OutputStatus;

    fn greeting() -> Defines {
        [("GREETING", "hi")].into_iter().collect()
    }

    /// The template structure
    /// root/
    ///   hello.txt.in      "Hello ${GREETING}!"
    ///
    /// Expected output
    /// root/
    ///   hello.txt         "Hello hi!"
    #[test]
    fn it_works() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("hello.txt.in"), "Hello ${GREETING}!").unwrap();

        let defines = greeting();
        let processor = TemplateProcessor::new(&defines, root.path());
        let job = TemplateJob::dot_in("hello.txt.in").unwrap();
        let outcome = processor.process(&job).unwrap();

        assert_eq!(outcome, WriteOutcome { existed: false, updated: true });
        assert_eq!(fs::read_to_string(root.path().join("hello.txt")).unwrap(), "Hello hi!");
    }

    #[test]
    fn second_render_is_a_no_op() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("a.txt.in");
        let output = root.path().join("a.txt");
        fs::write(&input, "${GREETING}\n").unwrap();
        let defines = greeting();

        let first = render(&input, &output, &defines, false, "#").unwrap();
        let mtime = fs::metadata(&output).unwrap().modified().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let second = render(&input, &output, &defines, false, "#").unwrap();

        assert_eq!(first.status(), OutputStatus::Created);
        assert_eq!(second, WriteOutcome { existed: true, updated: false });
        assert_eq!(fs::metadata(&output).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn creates_missing_directories_when_asked() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("Constants.java.in");
        fs::write(&input, "//#ifdef GREETING\nString g = \"${GREETING}\";\n//#endif\n").unwrap();
        let output = root.path().join("src/main/java/Constants.java");

        render(&input, &output, &greeting(), true, "//#").unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "String g = \"hi\";\n");
    }

    #[test]
    fn missing_input_creates_nothing() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("out/never.txt");

        let err = render(root.path().join("never.txt.in"), &output, &greeting(), true, "#")
            .unwrap_err();

        assert!(matches!(err, Error::NotFoundError { .. }));
        assert!(!root.path().join("out").exists());
    }

    #[test]
    fn uncreatable_output_directory_is_not_found() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("a.in");
        fs::write(&input, "${GREETING}\n").unwrap();
        fs::write(root.path().join("blocker"), "a file, not a directory").unwrap();
        let output = root.path().join("blocker/sub/a");

        let err = render(&input, &output, &greeting(), true, "#").unwrap_err();

        match err {
            Error::NotFoundError { path, .. } => assert_eq!(path, root.path().join("blocker/sub")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(root.path().join("blocker").is_file());
    }

    #[test]
    fn directive_errors_propagate() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("bad.in");
        fs::write(&input, "#ifdef GREETING\n").unwrap();

        let err = render(&input, root.path().join("bad"), &greeting(), false, "#").unwrap_err();
        assert!(matches!(err, Error::DirectiveSyntaxError { .. }));
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("x.in"), "${GREETING}\n").unwrap();
        let defines = greeting();
        let job = TemplateJob::dot_in("x.in").unwrap().with_create_missing_dirs(true);

        let outcome = TemplateProcessor::new(&defines, root.path()).dry_run(true).process(&job).unwrap();

        assert!(outcome.updated);
        assert!(!root.path().join("x").exists());
    }
}
