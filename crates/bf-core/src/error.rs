use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BenchError {
    #[error("Catalog is unavailable: {message}")]
    CatalogUnavailable { message: String },
    #[error("No catalog has been loaded.")]
    CatalogNotLoaded,
    #[error("Function \"{name}\" does not exist in the catalog.")]
    FunctionNotFound { name: String },
    #[error("No function has been selected.")]
    NoFunctionSelected,
    #[error("Function \"{function}\" needs a dimension value.")]
    DimensionRequired { function: String },
    #[error("Input domain of \"{function}\" is malformed: {message}")]
    MalformedDomain { function: String, message: String },
    #[error("Formula of \"{function}\" is malformed: {message}")]
    MalformedFormula { function: String, message: String },
    #[error("Point does not match function \"{function}\": expected {expected}, got {found}.")]
    InvalidPoint {
        function: String,
        expected: String,
        found: String,
    },
    #[error("Parameter name \"{name}\" is not a valid identifier.")]
    InvalidParameter { name: String },
    #[error("Evaluation of \"{function}\" failed: {message}")]
    EvaluationFailed { function: String, message: String },
    #[error("Evaluator output for \"{function}\" is not a numeric result: {output:?}")]
    MalformedEvaluatorOutput { function: String, output: String },
}

impl BenchError {
    pub fn catalog_unavailable(message: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
        }
    }

    pub fn evaluation_failed(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EvaluationFailed {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::CatalogUnavailable { .. } => "CATALOG_UNAVAILABLE",
            Self::CatalogNotLoaded => "CATALOG_NOT_LOADED",
            Self::FunctionNotFound { .. } => "FUNCTION_NOT_FOUND",
            Self::NoFunctionSelected => "NO_FUNCTION_SELECTED",
            Self::DimensionRequired { .. } => "DIMENSION_REQUIRED",
            Self::MalformedDomain { .. } => "MALFORMED_DOMAIN",
            Self::MalformedFormula { .. } => "MALFORMED_FORMULA",
            Self::InvalidPoint { .. } => "INVALID_POINT",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::EvaluationFailed { .. } => "EVALUATION_FAILED",
            Self::MalformedEvaluatorOutput { .. } => "MALFORMED_EVALUATOR_OUTPUT",
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_kind() {
        let errors = [
            BenchError::catalog_unavailable("x"),
            BenchError::CatalogNotLoaded,
            BenchError::FunctionNotFound {
                name: "f".to_string(),
            },
            BenchError::NoFunctionSelected,
            BenchError::DimensionRequired {
                function: "f".to_string(),
            },
            BenchError::MalformedDomain {
                function: "f".to_string(),
                message: "m".to_string(),
            },
            BenchError::MalformedFormula {
                function: "f".to_string(),
                message: "m".to_string(),
            },
            BenchError::InvalidPoint {
                function: "f".to_string(),
                expected: "2".to_string(),
                found: "3".to_string(),
            },
            BenchError::InvalidParameter {
                name: "1x".to_string(),
            },
            BenchError::evaluation_failed("f", "boom"),
            BenchError::MalformedEvaluatorOutput {
                function: "f".to_string(),
                output: "?".to_string(),
            },
        ];
        let mut codes = errors.iter().map(BenchError::code).collect::<Vec<_>>();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn display_includes_context() {
        let error = BenchError::FunctionNotFound {
            name: "nope".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Function \"nope\" does not exist in the catalog."
        );
        assert_eq!(
            BenchError::evaluation_failed("sphere", "exit status 1").to_string(),
            "Evaluation of \"sphere\" failed: exit status 1"
        );
    }
}
