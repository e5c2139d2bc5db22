use bf_runtime::DEFAULT_EVALUATOR_PROGRAM;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "benchfn")]
#[command(about = "Benchmark function catalog CLI")]
pub(crate) struct Cli {
    /// Log engine activity to stderr.
    #[arg(long = "verbose", short = 'v', global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    List(ListArgs),
    Search(SearchArgs),
    Info(InfoArgs),
    Eval(EvalArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    #[arg(long = "catalog")]
    pub(crate) catalog: String,
}

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    #[arg(long = "catalog")]
    pub(crate) catalog: String,
    /// `field=value`; `field=true|false` tests whether the field is set.
    #[arg(long = "where")]
    pub(crate) predicates: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct InfoArgs {
    #[arg(long = "catalog")]
    pub(crate) catalog: String,
    #[arg(long = "function")]
    pub(crate) function: String,
    #[arg(long = "dimension")]
    pub(crate) dimension: Option<usize>,
}

#[derive(Debug, Args)]
pub(crate) struct EvalArgs {
    #[arg(long = "catalog")]
    pub(crate) catalog: String,
    #[arg(long = "function")]
    pub(crate) function: String,
    /// `x` for one-dimensional functions, `x1,x2,...` otherwise.
    #[arg(long = "point", allow_hyphen_values = true)]
    pub(crate) point: String,
    /// `name=value` or `name=v1,v2,...`.
    #[arg(long = "param", allow_hyphen_values = true)]
    pub(crate) params: Vec<String>,
    #[command(flatten)]
    pub(crate) evaluator: EvaluatorArgs,
}

#[derive(Debug, Args)]
pub(crate) struct EvaluatorArgs {
    #[arg(long = "evaluator", default_value = DEFAULT_EVALUATOR_PROGRAM)]
    pub(crate) program: String,
    #[arg(long = "evaluator-arg", allow_hyphen_values = true)]
    pub(crate) args: Vec<String>,
    /// `0` disables the timeout.
    #[arg(long = "timeout-secs", default_value_t = 30)]
    pub(crate) timeout_secs: u64,
    #[arg(long = "artifact-root")]
    pub(crate) artifact_root: Option<String>,
}
