use crate::{
    cli::{Args, OutputMode},
    config::{build_definitions, Defines, InterpolationContext},
    constants::{exit_codes, DEFAULT_CONFIG_FILES, DEFAULT_INI, LOCAL_INI},
    error::Result,
    ioutils::{copy_file, OutputStatus, WriteOutcome},
    template::{JobManifest, TemplateJob, TemplateProcessor},
};
use std::path::PathBuf;

/// Result of one run: every processed job with what happened to its output.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outputs: Vec<(PathBuf, WriteOutcome)>,
}

impl RunSummary {
    pub fn count(&self, status: OutputStatus) -> usize {
        self.outputs.iter().filter(|(_, outcome)| outcome.status() == status).count()
    }

    pub fn any_updated(&self) -> bool {
        self.outputs.iter().any(|(_, outcome)| outcome.updated)
    }

    /// `NEEDS_UPDATE` when a dry run found outputs to change, otherwise `SUCCESS`.
    pub fn exit_code(&self, dry_run: bool) -> i32 {
        if dry_run && self.any_updated() {
            exit_codes::NEEDS_UPDATE
        } else {
            exit_codes::SUCCESS
        }
    }
}

/// Main CLI runner: builds the definitions, then renders every job in order.
pub struct Runner {
    args: Args,
    context: InterpolationContext,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        Self { args, context: InterpolationContext::from_environment() }
    }

    /// Replaces the user name and timestamp available to configuration files.
    pub fn with_context(mut self, context: InterpolationContext) -> Self {
        self.context = context;
        self
    }

    /// Executes the complete preprocessing workflow
    pub fn run(self) -> Result<RunSummary> {
        let mode = self.args.output_mode();

        // Job names are validated before anything is written.
        let jobs = JobManifest::discover(&self.args.root, self.args.manifest.as_deref())?.jobs()?;

        if self.bootstrap_local_ini()? && mode == OutputMode::Verbose {
            println!("Wrote local {LOCAL_INI} definitions.");
        }

        let defines = self.load_defines(mode)?;

        let summary = self.process_jobs(&jobs, &defines, mode)?;
        log::info!(
            "{} created, {} updated, {} unchanged",
            summary.count(OutputStatus::Created),
            summary.count(OutputStatus::Overwritten),
            summary.count(OutputStatus::Unchanged)
        );
        Ok(summary)
    }

    /// Copies the shipped defaults to the local override file if it does not
    /// exist yet. Returns whether a file was written.
    fn bootstrap_local_ini(&self) -> Result<bool> {
        if self.args.no_bootstrap || self.args.dry_run {
            return Ok(false);
        }
        let local = self.args.root.join(LOCAL_INI);
        let default = self.args.root.join(DEFAULT_INI);
        if local.exists() || !default.is_file() {
            return Ok(false);
        }
        log::debug!("Copying '{}' to '{}'", default.display(), local.display());
        copy_file(&default, &local)?;
        Ok(true)
    }

    fn config_paths(&self) -> Vec<PathBuf> {
        let configs = if self.args.configs.is_empty() {
            DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).collect()
        } else {
            self.args.configs.clone()
        };
        configs.into_iter().map(|path| self.args.root.join(path)).collect()
    }

    fn load_defines(&self, mode: OutputMode) -> Result<Defines> {
        let configs = self.config_paths();
        if mode == OutputMode::Verbose {
            let names: Vec<_> = configs.iter().map(|p| p.display().to_string()).collect();
            println!(
                "Reading preprocessor definitions from {names:?} (later files override earlier files)."
            );
        }

        let defines = build_definitions(&configs, &self.context)?;

        if mode == OutputMode::Verbose {
            for (key, value) in defines.iter() {
                println!("{key} = {value}");
            }
        }
        Ok(defines)
    }

    /// Processes jobs in order; the first failure ends the run.
    fn process_jobs(
        &self,
        jobs: &[TemplateJob],
        defines: &Defines,
        mode: OutputMode,
    ) -> Result<RunSummary> {
        let processor =
            TemplateProcessor::new(defines, &self.args.root).dry_run(self.args.dry_run);
        let prefix = if self.args.dry_run { "[DRY RUN] " } else { "" };
        let mut summary = RunSummary::default();

        for job in jobs {
            let outcome = processor.process(job)?;
            log::info!("{prefix}{} ({})", job.output.display(), outcome.status());

            match mode {
                OutputMode::Verbose => println!(
                    "{prefix}Preprocessing {} to {}",
                    job.input.display(),
                    job.output.display()
                ),
                // In a dry run the manifest lists only what would change.
                OutputMode::Files if !self.args.dry_run || outcome.updated => {
                    println!("{}", job.output.display())
                }
                _ => {}
            }
            summary.outputs.push((job.output.clone(), outcome));
        }

        Ok(summary)
    }
}

/// Main entry point for CLI execution
pub fn run(args: Args) -> Result<RunSummary> {
    Runner::new(args).run()
}
