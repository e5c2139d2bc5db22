use std::collections::BTreeMap;

use bf_catalog::SearchPredicates;
use bf_runtime::EvalValue;
use serde_json::Value;

use crate::{map_cli_param, map_cli_point, map_cli_predicate, CliError};

fn parse_numbers(raw: &str) -> Option<Vec<f64>> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);
    inner
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

fn parse_value(raw: &str) -> Option<EvalValue> {
    let trimmed = raw.trim();
    if trimmed.contains(',') || trimmed.starts_with('[') {
        return parse_numbers(trimmed).map(EvalValue::Vector);
    }
    trimmed.parse::<f64>().ok().map(EvalValue::Scalar)
}

pub(crate) fn parse_point(raw: &str) -> Result<EvalValue, CliError> {
    parse_value(raw).ok_or_else(|| map_cli_point(raw))
}

pub(crate) fn parse_params(raw: &[String]) -> Result<BTreeMap<String, EvalValue>, CliError> {
    let mut params = BTreeMap::new();
    for entry in raw {
        let (name, value) = entry.split_once('=').ok_or_else(|| map_cli_param(entry))?;
        let value = parse_value(value).ok_or_else(|| map_cli_param(entry))?;
        params.insert(name.trim().to_string(), value);
    }
    Ok(params)
}

pub(crate) fn parse_predicates(raw: &[String]) -> Result<SearchPredicates, CliError> {
    let mut predicates = SearchPredicates::new();
    for entry in raw {
        let (field, value) = entry
            .split_once('=')
            .filter(|(field, _)| !field.trim().is_empty())
            .ok_or_else(|| map_cli_predicate(entry))?;
        let value = match value.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::String(other.to_string()),
        };
        predicates.insert(field.trim().to_string(), value);
    }
    Ok(predicates)
}
