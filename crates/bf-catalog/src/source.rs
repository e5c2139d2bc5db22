use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bf_core::BenchError;
use serde_json::Value;
use walkdir::WalkDir;

use crate::Catalog;

/// Loads a catalog from a single JSON file or from every `.json` file under a
/// directory. Implementation paths resolve against the source's directory.
pub fn load_catalog(source: &Path) -> Result<Catalog, BenchError> {
    if source.is_dir() {
        let entries = read_entries_from_dir(source)?;
        return Catalog::from_entries(entries, source.to_path_buf());
    }

    let entries = read_entries_from_file(source)?;
    let artifact_root = match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Catalog::from_entries(entries, artifact_root)
}

fn read_entries_from_dir(catalog_dir: &Path) -> Result<BTreeMap<String, Value>, BenchError> {
    let mut entries = BTreeMap::new();
    let mut files = 0usize;

    for entry in WalkDir::new(catalog_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        files += 1;
        for (name, value) in read_entries_from_file(path)? {
            if entries.contains_key(&name) {
                return Err(BenchError::catalog_unavailable(format!(
                    "function \"{}\" is defined more than once (again in {})",
                    name,
                    path.display()
                )));
            }
            entries.insert(name, value);
        }
    }

    if files == 0 {
        return Err(BenchError::catalog_unavailable(format!(
            "no .json files under {}",
            catalog_dir.display()
        )));
    }

    Ok(entries)
}

fn read_entries_from_file(path: &Path) -> Result<BTreeMap<String, Value>, BenchError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        BenchError::catalog_unavailable(format!("failed to read {}: {}", path.display(), error))
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|error| {
        BenchError::catalog_unavailable(format!("failed to parse {}: {}", path.display(), error))
    })?;
    let Value::Object(entries) = value else {
        return Err(BenchError::catalog_unavailable(format!(
            "{} must contain an object keyed by function name",
            path.display()
        )));
    };
    log::debug!("read {} catalog entries from {}", entries.len(), path.display());
    Ok(entries.into_iter().collect())
}
