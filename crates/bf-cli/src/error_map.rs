use bf_core::BenchError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct CliError {
    pub code: String,
    pub message: String,
}

impl CliError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<BenchError> for CliError {
    fn from(error: BenchError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

pub(crate) fn emit_error(error: CliError) -> i32 {
    log::debug!("command failed: {}", error);
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "null".to_string())
    );
    1
}

pub(crate) fn map_cli_point(raw: &str) -> CliError {
    CliError::new("CLI_POINT_INVALID", format!("Invalid point: {:?}", raw))
}

pub(crate) fn map_cli_param(raw: &str) -> CliError {
    CliError::new(
        "CLI_PARAM_INVALID",
        format!("Invalid parameter (expected name=value): {:?}", raw),
    )
}

pub(crate) fn map_cli_predicate(raw: &str) -> CliError {
    CliError::new(
        "CLI_PREDICATE_INVALID",
        format!("Invalid predicate (expected field=value): {:?}", raw),
    )
}
