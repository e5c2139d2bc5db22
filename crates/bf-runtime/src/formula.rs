use rhai::{Array, Dynamic, Engine, EvalAltResult, Position, Scope, FLOAT, INT};

/// Name of the only variable a catalog formula may read.
pub const DIMENSION_VARIABLE: &str = "d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaLimits {
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_array_size: usize,
}

impl Default for FormulaLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_call_levels: 8,
            max_expr_depth: 64,
            max_array_size: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    List(Vec<f64>),
    /// The formula evaluated to `()`: no value is known for this input.
    Unknown,
}

/// Evaluates catalog formulas in a locked-down rhai engine: strict variables,
/// no `eval`, bounded work, and no host functions beyond `repeat`.
pub struct FormulaEngine {
    engine: Engine,
}

impl FormulaEngine {
    pub fn new(limits: FormulaLimits) -> Self {
        let mut engine = Engine::new();
        engine.set_strict_variables(true);
        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_string_size(1_024);
        engine.disable_symbol("eval");
        engine.on_print(|_| {});
        engine.on_debug(|_, _, _| {});

        let max_array_size = limits.max_array_size;
        engine.register_fn(
            "repeat",
            move |value: FLOAT, count: INT| -> Result<Array, Box<EvalAltResult>> {
                repeat_value(Dynamic::from_float(value), count, max_array_size)
            },
        );
        engine.register_fn(
            "repeat",
            move |value: INT, count: INT| -> Result<Array, Box<EvalAltResult>> {
                repeat_value(Dynamic::from_int(value), count, max_array_size)
            },
        );

        Self { engine }
    }

    pub fn evaluate(&self, source: &str, dimension: Option<usize>) -> Result<FormulaValue, String> {
        let mut scope = Scope::new();
        if let Some(dimension) = dimension {
            let dimension = INT::try_from(dimension)
                .map_err(|_| format!("dimension {} is out of range", dimension))?;
            scope.push_constant(DIMENSION_VARIABLE, dimension);
        }

        let value = self
            .engine
            .eval_with_scope::<Dynamic>(&mut scope, source)
            .map_err(|error| format!("formula eval failed: {}", error))?;
        log::debug!("formula {:?} with d={:?} -> {:?}", source, dimension, value);
        dynamic_to_formula_value(value)
    }
}

impl Default for FormulaEngine {
    fn default() -> Self {
        Self::new(FormulaLimits::default())
    }
}

fn repeat_value(
    value: Dynamic,
    count: INT,
    max_array_size: usize,
) -> Result<Array, Box<EvalAltResult>> {
    let count = usize::try_from(count).map_err(|_| {
        runtime_error(format!("repeat(value, n) expects non-negative n, got {}.", count))
    })?;
    if count > max_array_size {
        return Err(runtime_error(format!(
            "repeat(value, n) is limited to {} items.",
            max_array_size
        )));
    }
    Ok(vec![value; count])
}

fn runtime_error(message: String) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(message),
        Position::NONE,
    ))
}

fn dynamic_to_number(value: &Dynamic) -> Option<f64> {
    if let Ok(value) = value.as_int() {
        return Some(value as f64);
    }
    value.as_float().ok()
}

fn dynamic_to_formula_value(value: Dynamic) -> Result<FormulaValue, String> {
    if value.is_unit() {
        return Ok(FormulaValue::Unknown);
    }
    if let Some(number) = dynamic_to_number(&value) {
        return Ok(FormulaValue::Number(number));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in &array {
            let number = dynamic_to_number(item).ok_or_else(|| {
                format!("formula list items must be numbers, got {}", item.type_name())
            })?;
            out.push(number);
        }
        return Ok(FormulaValue::List(out));
    }

    Err(format!(
        "formula must produce a number or a list of numbers, got {}",
        value.type_name()
    ))
}
