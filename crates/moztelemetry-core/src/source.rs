//! Source descriptor: where the records of a dataset live.

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::schema::PartitionSchema;

/// Identifies a logical collection of records and how it is partitioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, alias = "dimensions", deserialize_with = "schema_or_dimensions")]
    pub schema: PartitionSchema,
}

// Catalog entries carry either `{"schema": {"dimensions": [...]}}` or a bare
// `{"dimensions": [...]}` list.
fn schema_or_dimensions<'de, D>(deserializer: D) -> Result<PartitionSchema, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Dimensions(Vec<crate::schema::Dimension>),
        Schema(PartitionSchema),
    }
    Ok(match Shape::deserialize(deserializer)? {
        Shape::Dimensions(dims) => PartitionSchema::new(dims),
        Shape::Schema(schema) => schema,
    })
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        SourceConfig {
            name: name.into(),
            bucket: bucket.into(),
            prefix: prefix.into(),
            ..SourceConfig::default()
        }
    }

    pub fn with_schema(mut self, schema: PartitionSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Check that the identity fields are present.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("bucket", &self.bucket),
            ("prefix", &self.prefix),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::configuration(format!(
                "source is missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Storage location: `<bucket>/<prefix>` with redundant slashes removed.
    pub fn location(&self) -> String {
        let bucket = self.bucket.trim_end_matches('/');
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            bucket.to_string()
        } else {
            format!("{bucket}/{prefix}")
        }
    }
}
