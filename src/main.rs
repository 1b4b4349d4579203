use preprocess::{
    cli::{get_args, get_log_level_from_verbose, run},
    error::default_error_handler,
};

fn main() {
    let args = get_args();
    let lvl = get_log_level_from_verbose(args.verbose);
    env_logger::Builder::new().filter_level(lvl).init();

    let dry_run = args.dry_run;
    match run(args) {
        Ok(summary) => std::process::exit(summary.exit_code(dry_run)),
        Err(err) => default_error_handler(err),
    }
}
