//! Record and summary types produced by scan engines (engine-agnostic).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single telemetry document. The schema is not fixed; it is passed through.
pub type Record = serde_json::Map<String, JsonValue>;

/// Lightweight descriptor of one record group (e.g. one stored object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Location identifier of the group, unique within a source.
    pub key: String,
    /// Payload size in bytes.
    pub size: u64,
    /// Partition values of the group, keyed by dimension name.
    #[serde(default)]
    pub dimensions: BTreeMap<String, JsonValue>,
}

impl Summary {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Summary {
            key: key.into(),
            size,
            dimensions: BTreeMap::new(),
        }
    }

    pub fn with_dimension(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.dimensions.insert(field.into(), value.into());
        self
    }
}

/// A record tagged with the key of the group it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRecord {
    pub group: String,
    pub record: Record,
}

/// Resolve a `/`-separated path (e.g. `payload/info/reason`) inside a record.
/// A path without separators is a plain top-level lookup.
pub fn lookup_path<'a>(record: &'a Record, path: &str) -> Option<&'a JsonValue> {
    if let Some(value) = record.get(path) {
        return Some(value);
    }
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = match current {
            JsonValue::Object(map) => map.get(part)?,
            JsonValue::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
