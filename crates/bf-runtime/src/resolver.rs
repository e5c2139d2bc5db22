use bf_core::{
    BenchError, Dimension, DomainEntry, FunctionRecord, Interval, MinimumLocation, MinimumValue,
    ParameterSpec, ResolvedMinimum,
};

use crate::formula::{FormulaEngine, FormulaValue};

/// Resolves the analytic properties of one record. Constants are returned
/// as-is, formulas run in the sandboxed [`FormulaEngine`].
pub struct PropertyResolver<'a> {
    record: &'a FunctionRecord,
    formulas: &'a FormulaEngine,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(record: &'a FunctionRecord, formulas: &'a FormulaEngine) -> Self {
        Self { record, formulas }
    }

    pub fn dimension(&self) -> Dimension {
        self.record.dimension
    }

    /// The record's own dimension wins; a parametric record needs a positive
    /// caller-supplied one.
    pub fn effective_dimension(&self, requested: Option<usize>) -> Result<usize, BenchError> {
        match self.record.dimension {
            Dimension::Fixed(dimension) => Ok(dimension),
            Dimension::Parametric => requested.filter(|dimension| *dimension > 0).ok_or_else(|| {
                BenchError::DimensionRequired {
                    function: self.record.name.clone(),
                }
            }),
        }
    }

    pub fn minimum_location(
        &self,
        requested: Option<usize>,
    ) -> Result<Option<Vec<f64>>, BenchError> {
        let Some(location) = &self.record.minimum_location else {
            return Ok(None);
        };

        match location {
            MinimumLocation::Points(points) => Ok(Some(points.clone())),
            MinimumLocation::Repeated(value) => {
                let dimension = self.effective_dimension(requested)?;
                Ok(Some(vec![*value; dimension]))
            }
            MinimumLocation::Formula(source) => {
                let dimension = self.effective_dimension(requested)?;
                match self.run_formula(source, Some(dimension))? {
                    FormulaValue::List(points) => {
                        if points.len() != dimension {
                            log::warn!(
                                "minimum location of \"{}\" has {} coordinates for dimension {}",
                                self.record.name,
                                points.len(),
                                dimension
                            );
                        }
                        Ok(Some(points))
                    }
                    FormulaValue::Unknown => Ok(None),
                    FormulaValue::Number(_) => Err(self.malformed_formula(
                        "minimum location formula must produce a list of numbers",
                    )),
                }
            }
        }
    }

    /// A formula that yields `()` means the minimum is not known for that
    /// dimension.
    pub fn minimum_value(
        &self,
        requested: Option<usize>,
    ) -> Result<Option<ResolvedMinimum>, BenchError> {
        match &self.record.minimum_value {
            None => Ok(None),
            Some(MinimumValue::Constant(value)) => Ok(Some(ResolvedMinimum::Single(*value))),
            Some(MinimumValue::Tabulated(values)) => {
                Ok(Some(ResolvedMinimum::Tabulated(values.clone())))
            }
            Some(MinimumValue::Formula(source)) => {
                let dimension = self.effective_dimension(requested)?;
                Ok(match self.run_formula(source, Some(dimension))? {
                    FormulaValue::Number(value) => Some(ResolvedMinimum::Single(value)),
                    FormulaValue::List(values) => Some(ResolvedMinimum::Tabulated(values)),
                    FormulaValue::Unknown => None,
                })
            }
        }
    }

    pub fn parameters(&self) -> Option<ParameterSpec> {
        self.record
            .parameters
            .as_ref()
            .and_then(|field| field.spec())
            .cloned()
    }

    pub fn input_domain(&self, requested: Option<usize>) -> Result<Vec<Interval>, BenchError> {
        let dimension = self.effective_dimension(requested)?;
        let entries = self.record.input_domain.as_deref().unwrap_or_default();

        match entries {
            [] => Err(self.malformed_domain("no input domain entries")),
            // A parametric record's single entry may depend on `d`, so it is
            // resolved once per coordinate with `d` bound.
            [entry] if self.record.dimension.is_parametric() => (0..dimension)
                .map(|_| self.resolve_domain_entry(entry, Some(dimension)))
                .collect(),
            entries if entries.len() == dimension => entries
                .iter()
                .map(|entry| self.resolve_domain_entry(entry, None))
                .collect(),
            [entry] => {
                let interval = self.resolve_domain_entry(entry, None)?;
                Ok(vec![interval; dimension])
            }
            entries => Err(self.malformed_domain(&format!(
                "{} domain entries do not fit dimension {}",
                entries.len(),
                dimension
            ))),
        }
    }

    fn resolve_domain_entry(
        &self,
        entry: &DomainEntry,
        dimension: Option<usize>,
    ) -> Result<Interval, BenchError> {
        let [low, high] = match entry {
            DomainEntry::Interval(interval) => *interval,
            DomainEntry::Formula(source) => match self.formulas.evaluate(source, dimension) {
                Ok(FormulaValue::List(values)) if values.len() == 2 => [values[0], values[1]],
                Ok(other) => {
                    return Err(self.malformed_domain(&format!(
                        "formula {:?} must produce a [low, high] pair, got {:?}",
                        source, other
                    )))
                }
                Err(message) => return Err(self.malformed_domain(&message)),
            },
            DomainEntry::Other(value) => {
                return Err(self.malformed_domain(&format!(
                    "entry {} is neither a [low, high] pair nor a formula",
                    value
                )))
            }
        };

        if !(low <= high) {
            return Err(self.malformed_domain(&format!(
                "interval [{}, {}] has low above high",
                low, high
            )));
        }
        Ok([low, high])
    }

    fn run_formula(
        &self,
        source: &str,
        dimension: Option<usize>,
    ) -> Result<FormulaValue, BenchError> {
        self.formulas
            .evaluate(source, dimension)
            .map_err(|message| self.malformed_formula(&message))
    }

    fn malformed_formula(&self, message: &str) -> BenchError {
        BenchError::MalformedFormula {
            function: self.record.name.clone(),
            message: message.to_string(),
        }
    }

    fn malformed_domain(&self, message: &str) -> BenchError {
        BenchError::MalformedDomain {
            function: self.record.name.clone(),
            message: message.to_string(),
        }
    }
}
