use std::ffi::OsString;

use clap::Parser;
use log::LevelFilter;

mod cli_args;
mod commands;
mod error_map;
mod output;
mod request;

pub(crate) use cli_args::{
    Cli, EvalArgs, EvaluatorArgs, InfoArgs, ListArgs, Mode, SearchArgs,
};
pub use error_map::CliError;
pub(crate) use error_map::{emit_error, map_cli_param, map_cli_point, map_cli_predicate};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::List(args) => commands::run_list(args),
        Mode::Search(args) => commands::run_search(args),
        Mode::Info(args) => commands::run_info(args),
        Mode::Eval(args) => commands::run_eval(args),
    }
}

/// Logs go to stderr so stdout stays a clean line protocol. `RUST_LOG`
/// overrides the level picked from `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
