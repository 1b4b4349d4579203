use crate::constants::verbosity;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// CLI arguments for the preprocessor.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Preprocess Android services files.", long_about = None)]
pub struct Args {
    /// Configuration file(s), later files override earlier files.
    /// [default: preprocess.ini.default preprocess.ini]
    #[arg(short = 'C', long = "configs", value_name = "INIFILE", num_args = 1..)]
    pub configs: Vec<PathBuf>,

    /// Do not print output file names.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose output; repeat (`-vv`, `-vvv`) for debug logging.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Job manifest (JSON or YAML) listing the templates to render.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory that configuration, manifest and template paths are relative to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Do not create preprocess.ini from preprocess.ini.default.
    #[arg(long = "no-bootstrap")]
    pub no_bootstrap: bool,

    /// Report outputs that would change without writing anything.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// How much the runner prints to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Nothing.
    Quiet,
    /// One output path per rendered job.
    Files,
    /// Configuration, definitions and one line per job.
    Verbose,
}

impl Args {
    pub fn output_mode(&self) -> OutputMode {
        match (self.quiet, self.verbose) {
            (true, _) => OutputMode::Quiet,
            (false, 0) => OutputMode::Files,
            (false, _) => OutputMode::Verbose,
        }
    }
}

pub fn get_args() -> Args {
    Args::parse()
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Warn,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}
