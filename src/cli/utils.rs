//! Shared CLI utilities.

use anyhow::Result;
use serde::Serialize;
use serde_yaml::Value;

use super::args::OutputFormat;

/// Print `value` as pretty JSON, or the supplied text rendering.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text().trim_end()),
    }
    Ok(())
}

/// Look up a dotted path (`network.cidr`, `subnets.0`) in a params document.
///
/// A leading dot is accepted so paths from merge warnings can be pasted back.
pub fn lookup_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').filter(|segment| !segment.is_empty()).try_fold(document, |node, segment| {
        match node {
            Value::Mapping(map) => map.get(segment),
            Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_path_walks_mappings_and_sequences() {
        let doc: Value =
            serde_yaml::from_str("network:\n  subnets:\n    - cidr: 10.0.1.0/24\n").expect("yaml");

        assert_eq!(
            lookup_path(&doc, "network.subnets.0.cidr").and_then(Value::as_str),
            Some("10.0.1.0/24")
        );
        assert_eq!(lookup_path(&doc, ".network.subnets.0.cidr"), lookup_path(&doc, "network.subnets.0.cidr"));
        assert!(lookup_path(&doc, "network.subnets.4").is_none());
        assert!(lookup_path(&doc, "network.missing").is_none());
        assert_eq!(lookup_path(&doc, ""), Some(&doc));
    }
}
