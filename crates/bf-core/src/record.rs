use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const PARAMETRIC_DIMENSION_LABEL: &str = "d";

pub type Interval = [f64; 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    Fixed(usize),
    Parametric,
}

impl Dimension {
    pub fn fixed(self) -> Option<usize> {
        match self {
            Self::Fixed(value) => Some(value),
            Self::Parametric => None,
        }
    }

    pub fn is_parametric(self) -> bool {
        matches!(self, Self::Parametric)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Count(u64),
    Text(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = String;

    fn try_from(value: DimensionRepr) -> Result<Self, Self::Error> {
        let count = match value {
            DimensionRepr::Count(count) => count,
            DimensionRepr::Text(text) => match text.trim().parse::<u64>() {
                Ok(count) => count,
                Err(_) => return Ok(Self::Parametric),
            },
        };
        if count == 0 {
            return Err("dimension must be a positive integer".to_string());
        }
        usize::try_from(count)
            .map(Self::Fixed)
            .map_err(|_| format!("dimension {} is out of range", count))
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(value: Dimension) -> Self {
        match value {
            Dimension::Fixed(count) => Self::Count(count as u64),
            Dimension::Parametric => Self::Text(PARAMETRIC_DIMENSION_LABEL.to_string()),
        }
    }
}

/// Where the global minimum sits. A bare number is repeated once per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinimumLocation {
    Points(Vec<f64>),
    Repeated(f64),
    Formula(String),
}

/// Known minimum objective value. Functions with several tabulated minima
/// list them all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinimumValue {
    Constant(f64),
    Tabulated(Vec<f64>),
    Formula(String),
}

/// A resolved minimum value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedMinimum {
    Single(f64),
    Tabulated(Vec<f64>),
}

impl ResolvedMinimum {
    pub fn single(&self) -> Option<f64> {
        match self {
            Self::Single(value) => Some(*value),
            Self::Tabulated(_) => None,
        }
    }
}

/// One per-coordinate domain entry. Anything that is neither a numeric pair
/// nor formula text is kept as `Other` and rejected when the domain is
/// resolved, so a single odd record does not stop the catalog from loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainEntry {
    Interval(Interval),
    Formula(String),
    Other(Value),
}

fn domain_entries<'de, D>(deserializer: D) -> Result<Option<Vec<DomainEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    };
    Ok(Some(
        entries
            .into_iter()
            .map(|entry| {
                serde_json::from_value(entry.clone()).unwrap_or(DomainEntry::Other(entry))
            })
            .collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterSpec {
    Description(String),
    Named(BTreeMap<String, String>),
}

/// Catalog form of the parameter description: either `[has_parameters, spec]`
/// or the spec on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterField {
    Flagged(bool, Option<ParameterSpec>),
    Spec(ParameterSpec),
}

impl ParameterField {
    pub fn spec(&self) -> Option<&ParameterSpec> {
        match self {
            Self::Flagged(false, _) => None,
            Self::Flagged(true, spec) => spec.as_ref(),
            Self::Spec(spec) => Some(spec),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(skip)]
    pub name: String,
    pub dimension: Dimension,
    #[serde(default, rename = "minimum_x", alias = "minimum_location")]
    pub minimum_location: Option<MinimumLocation>,
    #[serde(default, rename = "minimum_f", alias = "minimum_value")]
    pub minimum_value: Option<MinimumValue>,
    #[serde(default)]
    pub parameters: Option<ParameterField>,
    #[serde(default, deserialize_with = "domain_entries")]
    pub input_domain: Option<Vec<DomainEntry>>,
    #[serde(default, alias = "evaluator_reference")]
    pub implementation: Option<String>,
}

impl FunctionRecord {
    pub fn from_json(name: &str, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut record: FunctionRecord = serde_json::from_value(value)?;
        record.name = name.to_string();
        Ok(record)
    }
}
