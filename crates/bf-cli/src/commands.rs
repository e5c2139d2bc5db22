use std::path::{Path, PathBuf};
use std::time::Duration;

use bf_runtime::{BenchSession, EvaluatorConfig, SessionOptions};

use crate::output::{emit_json, emit_names, emit_ok};
use crate::request::{parse_params, parse_point, parse_predicates};
use crate::{CliError, EvalArgs, EvaluatorArgs, InfoArgs, ListArgs, SearchArgs};

pub(crate) fn evaluator_config(args: &EvaluatorArgs) -> EvaluatorConfig {
    EvaluatorConfig {
        program: args.program.clone(),
        args: args.args.clone(),
        timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
        artifact_root: args.artifact_root.as_ref().map(PathBuf::from),
    }
}

pub(crate) fn load_session(catalog: &str, options: SessionOptions) -> Result<BenchSession, CliError> {
    let mut session = BenchSession::new(options);
    let loaded = session.load(Path::new(catalog))?;
    log::info!("loaded {} functions from {}", loaded.len(), catalog);
    Ok(session)
}

pub(crate) fn run_list(args: ListArgs) -> Result<i32, CliError> {
    let session = load_session(&args.catalog, SessionOptions::default())?;
    emit_names(&session.names()?);
    Ok(0)
}

pub(crate) fn run_search(args: SearchArgs) -> Result<i32, CliError> {
    let predicates = parse_predicates(&args.predicates)?;
    let session = load_session(&args.catalog, SessionOptions::default())?;
    emit_names(&session.search(&predicates)?);
    Ok(0)
}

pub(crate) fn run_info(args: InfoArgs) -> Result<i32, CliError> {
    let mut session = load_session(&args.catalog, SessionOptions::default())?;
    let has_domain = session.select(&args.function)?.record.input_domain.is_some();

    let dimension = session.dimension()?;
    let minimum_x = session.minimum_location(args.dimension)?;
    let minimum_f = session.minimum_value(args.dimension)?;
    let parameters = session.parameters()?;
    let input_domain = if has_domain {
        Some(session.input_domain(args.dimension)?)
    } else {
        None
    };

    emit_ok();
    emit_json("FUNCTION", &args.function);
    emit_json("DIMENSION", &dimension);
    emit_json("MINIMUM_X", &minimum_x);
    emit_json("MINIMUM_F", &minimum_f);
    emit_json("PARAMETERS", &parameters);
    emit_json("INPUT_DOMAIN", &input_domain);
    Ok(0)
}

pub(crate) fn run_eval(args: EvalArgs) -> Result<i32, CliError> {
    let point = parse_point(&args.point)?;
    let params = parse_params(&args.params)?;
    let options = SessionOptions {
        evaluator: evaluator_config(&args.evaluator),
        ..SessionOptions::default()
    };
    let mut session = load_session(&args.catalog, options)?;
    session.select(&args.function)?;

    let value = session.evaluate(&point, (!params.is_empty()).then_some(&params))?;
    emit_ok();
    emit_json("FUNCTION", &args.function);
    emit_json("VALUE", &value);
    Ok(0)
}
