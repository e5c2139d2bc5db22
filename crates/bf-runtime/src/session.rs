use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use bf_catalog::{load_catalog, Catalog, SearchPredicates};
use bf_core::{BenchError, Dimension, FunctionRecord, Interval, ParameterSpec, ResolvedMinimum};

use crate::bridge::{EvalValue, EvaluatorBridge, EvaluatorConfig};
use crate::formula::{FormulaEngine, FormulaLimits};
use crate::resolver::PropertyResolver;

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub evaluator: EvaluatorConfig,
    pub formula_limits: FormulaLimits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub record: Arc<FunctionRecord>,
}

/// One caller's view of the catalog: the loaded catalog and at most one
/// selected function that every query and evaluation reads.
pub struct BenchSession {
    catalog: Option<Catalog>,
    selection: Option<Selection>,
    formulas: FormulaEngine,
    bridge: EvaluatorBridge,
}

impl BenchSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            catalog: None,
            selection: None,
            formulas: FormulaEngine::new(options.formula_limits),
            bridge: EvaluatorBridge::new(options.evaluator),
        }
    }

    pub fn with_catalog(catalog: Catalog, options: SessionOptions) -> Self {
        let mut session = Self::new(options);
        session.catalog = Some(catalog);
        session
    }

    /// Replaces the catalog and clears the selection. A failed load keeps the
    /// previous state.
    pub fn load(&mut self, source: &Path) -> Result<&Catalog, BenchError> {
        let catalog = load_catalog(source)?;
        self.selection = None;
        Ok(self.catalog.insert(catalog))
    }

    pub fn catalog(&self) -> Result<&Catalog, BenchError> {
        self.catalog.as_ref().ok_or(BenchError::CatalogNotLoaded)
    }

    pub fn names(&self) -> Result<Vec<String>, BenchError> {
        Ok(self.catalog()?.names())
    }

    pub fn search(&self, predicates: &SearchPredicates) -> Result<Vec<String>, BenchError> {
        Ok(self.catalog()?.search(predicates))
    }

    pub fn select(&mut self, name: &str) -> Result<&Selection, BenchError> {
        let catalog = self.catalog()?;
        if catalog.is_empty() {
            return Err(BenchError::CatalogNotLoaded);
        }
        let record = catalog
            .get(name)
            .cloned()
            .ok_or_else(|| BenchError::FunctionNotFound {
                name: name.to_string(),
            })?;

        log::debug!("selected function {}", name);
        Ok(self.selection.insert(Selection {
            name: name.to_string(),
            record,
        }))
    }

    pub fn current(&self) -> Result<&Selection, BenchError> {
        self.selection.as_ref().ok_or(BenchError::NoFunctionSelected)
    }

    pub fn dimension(&self) -> Result<Dimension, BenchError> {
        Ok(self.resolver()?.dimension())
    }

    pub fn minimum_location(
        &self,
        requested_dim: Option<usize>,
    ) -> Result<Option<Vec<f64>>, BenchError> {
        self.resolver()?.minimum_location(requested_dim)
    }

    pub fn minimum_value(
        &self,
        requested_dim: Option<usize>,
    ) -> Result<Option<ResolvedMinimum>, BenchError> {
        self.resolver()?.minimum_value(requested_dim)
    }

    pub fn parameters(&self) -> Result<Option<ParameterSpec>, BenchError> {
        Ok(self.resolver()?.parameters())
    }

    pub fn input_domain(&self, requested_dim: Option<usize>) -> Result<Vec<Interval>, BenchError> {
        self.resolver()?.input_domain(requested_dim)
    }

    pub fn evaluate(
        &self,
        point: &EvalValue,
        parameters: Option<&BTreeMap<String, EvalValue>>,
    ) -> Result<f64, BenchError> {
        let selection = self.current()?;
        let catalog = self.catalog()?;
        let no_parameters = BTreeMap::new();
        self.bridge.evaluate(
            &selection.record,
            catalog.artifact_root(),
            point,
            parameters.unwrap_or(&no_parameters),
        )
    }

    fn resolver(&self) -> Result<PropertyResolver<'_>, BenchError> {
        let selection = self.current()?;
        Ok(PropertyResolver::new(&selection.record, &self.formulas))
    }
}

impl Default for BenchSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}
