mod search;
mod source;

pub use search::{record_matches, SearchPredicates};
pub use source::load_catalog;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bf_core::{BenchError, FunctionRecord};
use serde_json::Value;

/// In-memory catalog keyed by function name.
///
/// Typed records serve property resolution; the raw JSON objects are kept
/// alongside so that searches can match on any field, including ones the
/// typed model does not know about.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: BTreeMap<String, Arc<FunctionRecord>>,
    raw: BTreeMap<String, Value>,
    artifact_root: PathBuf,
}

impl Catalog {
    pub fn from_json_str(
        text: &str,
        artifact_root: impl Into<PathBuf>,
    ) -> Result<Self, BenchError> {
        let value: Value = serde_json::from_str(text).map_err(|error| {
            BenchError::catalog_unavailable(format!("invalid catalog json: {}", error))
        })?;
        let Value::Object(entries) = value else {
            return Err(BenchError::catalog_unavailable(
                "catalog top level must be an object keyed by function name",
            ));
        };
        Self::from_entries(entries.into_iter().collect(), artifact_root.into())
    }

    pub(crate) fn from_entries(
        entries: BTreeMap<String, Value>,
        artifact_root: PathBuf,
    ) -> Result<Self, BenchError> {
        let mut records = BTreeMap::new();
        for (name, value) in &entries {
            let record = FunctionRecord::from_json(name, value.clone()).map_err(|error| {
                BenchError::catalog_unavailable(format!(
                    "record \"{}\" is invalid: {}",
                    name, error
                ))
            })?;
            records.insert(name.clone(), Arc::new(record));
        }
        log::debug!(
            "catalog loaded with {} functions, artifact root {}",
            records.len(),
            artifact_root.display()
        );

        Ok(Self {
            records,
            raw: entries,
            artifact_root,
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FunctionRecord>> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    /// Names of the records matching every predicate, in name order.
    pub fn search(&self, predicates: &SearchPredicates) -> Vec<String> {
        self.raw
            .iter()
            .filter(|(_, record)| record_matches(record, predicates))
            .map(|(name, _)| name.clone())
            .collect()
    }
}
