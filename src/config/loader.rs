//! Params file loading

use super::merge::{is_composite, key_segment, merge_deep, ROOT_PATH};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Load and merge params files, left to right.
///
/// No paths yields an empty mapping without touching the filesystem. Files are
/// read and parsed in parallel, but the fold follows input order. Conflicts are
/// logged and never fail the load.
pub fn load_params(paths: &[PathBuf]) -> Result<Value> {
    if paths.is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }

    let documents = paths
        .par_iter()
        .map(|path| read_params_file(path))
        .collect::<Result<Vec<_>>>()?;

    let mut merged = Value::Mapping(Mapping::new());
    let mut provenance = Provenance::default();

    for (index, document) in documents.iter().enumerate() {
        let current = &paths[index];
        merged = merge_deep(&merged, document, |left, right, left_path, right_path| {
            if left_path != ROOT_PATH && right_path != ROOT_PATH && left != right {
                let previous = provenance
                    .owner_of(left_path)
                    .map(|i| paths[i].display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                tracing::warn!(
                    "Cannot cleanly merge params files (\"{}\" in {} and \"{}\" in {})",
                    left_path,
                    previous,
                    right_path,
                    current.display()
                );
            }
            None
        });
        provenance.record(document, index);
    }

    Ok(merged)
}

fn read_params_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed reading params file: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid YAML syntax: {}", path.display()))?;

    // An empty document contributes nothing.
    Ok(match value {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    })
}

/// Which file last supplied each dotted path.
#[derive(Default)]
struct Provenance {
    owners: HashMap<String, usize>,
}

impl Provenance {
    fn record(&mut self, document: &Value, index: usize) {
        if !is_composite(document) {
            self.owners.clear();
            return;
        }
        let mut paths = vec![String::new()];
        collect_paths(document, String::new(), &mut paths);
        for path in paths {
            self.owners.insert(path, index);
        }
    }

    /// Owner of `path`, or of its nearest recorded ancestor.
    fn owner_of(&self, path: &str) -> Option<usize> {
        let mut candidate = path;
        loop {
            if let Some(owner) = self.owners.get(candidate) {
                return Some(*owner);
            }
            candidate = &candidate[..candidate.rfind('.')?];
        }
    }
}

fn collect_paths(value: &Value, prefix: String, out: &mut Vec<String>) {
    if let Value::Mapping(map) = value {
        for (key, child) in map {
            let path = format!("{prefix}.{}", key_segment(key));
            collect_paths(child, path.clone(), out);
            out.push(path);
        }
    }
}
