//! Structural deep merge of two YAML documents.
//!
//! The merge knows nothing about params semantics. Conflicts are handed to a
//! caller-supplied resolver; when the resolver declines (`None`) the default
//! policy applies: sequences concatenate, everything else takes the right-hand
//! value.

use serde_yaml::{Mapping, Value};

/// Path reported to the resolver when either document is not a composite.
pub const ROOT_PATH: &str = "<root>";

/// Merge `right` into `left`, producing a new document.
///
/// The resolver receives `(left, right, left_path, right_path)` and may return a
/// replacement value. Neither operand is mutated.
pub fn merge_deep<F>(left: &Value, right: &Value, mut resolver: F) -> Value
where
    F: FnMut(&Value, &Value, &str, &str) -> Option<Value>,
{
    if !is_composite(left) || !is_composite(right) {
        resolver(&Value::Null, &Value::Null, ROOT_PATH, ROOT_PATH);
        return right.clone();
    }

    merge_at(left, right, "", "", &mut resolver)
}

fn merge_at<F>(left: &Value, right: &Value, left_path: &str, right_path: &str, resolver: &mut F) -> Value
where
    F: FnMut(&Value, &Value, &str, &str) -> Option<Value>,
{
    match (left, right) {
        (Value::Sequence(a), Value::Sequence(b)) => {
            resolver(left, right, left_path, right_path).unwrap_or_else(|| {
                let mut joined = Vec::with_capacity(a.len() + b.len());
                joined.extend(a.iter().cloned());
                joined.extend(b.iter().cloned());
                Value::Sequence(joined)
            })
        }
        (Value::Mapping(a), Value::Mapping(b)) => {
            Value::Mapping(merge_mappings(a, b, left_path, right_path, resolver))
        }
        _ => resolver(left, right, left_path, right_path).unwrap_or_else(|| right.clone()),
    }
}

fn merge_mappings<F>(
    left: &Mapping,
    right: &Mapping,
    left_path: &str,
    right_path: &str,
    resolver: &mut F,
) -> Mapping
where
    F: FnMut(&Value, &Value, &str, &str) -> Option<Value>,
{
    let mut merged = Mapping::with_capacity(left.len() + right.len());

    for (key, left_value) in left {
        let value = match right.get(key) {
            Some(right_value) => {
                let segment = key_segment(key);
                merge_at(
                    left_value,
                    right_value,
                    &format!("{left_path}.{segment}"),
                    &format!("{right_path}.{segment}"),
                    resolver,
                )
            }
            None => left_value.clone(),
        };
        merged.insert(key.clone(), value);
    }

    for (key, right_value) in right {
        if !left.contains_key(key) {
            merged.insert(key.clone(), right_value.clone());
        }
    }

    merged
}

pub(crate) fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Mapping(_) | Value::Sequence(_))
}

/// Render a mapping key as one segment of a dotted path.
pub(crate) fn key_segment(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "~".to_string(),
        other => serde_yaml::to_string(other).map(|s| s.trim_end().to_string()).unwrap_or_default(),
    }
}
