use std::collections::BTreeMap;

use serde_json::Value;

pub type SearchPredicates = BTreeMap<String, Value>;

/// Boolean predicates test "field present and non-null"; any other predicate
/// compares both sides as text.
pub fn record_matches(record: &Value, predicates: &SearchPredicates) -> bool {
    predicates.iter().all(|(field, expected)| {
        let actual = record.get(field);
        match expected {
            Value::Bool(wanted) => actual.is_some_and(|value| !value.is_null()) == *wanted,
            other => actual.is_some_and(|value| normalize_text(value) == normalize_text(other)),
        }
    })
}

fn normalize_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
