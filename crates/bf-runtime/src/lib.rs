pub mod bridge;
pub mod formula;
pub mod resolver;
mod session;

pub use bridge::{
    EvalValue, EvaluatorBridge, EvaluatorConfig, DEFAULT_EVALUATION_TIMEOUT,
    DEFAULT_EVALUATOR_PROGRAM,
};
pub use formula::{FormulaEngine, FormulaLimits, FormulaValue, DIMENSION_VARIABLE};
pub use resolver::PropertyResolver;
pub use session::{BenchSession, Selection, SessionOptions};
