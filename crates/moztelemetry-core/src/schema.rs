use serde::{Deserialize, Serialize};

/// One partitioning level of a source (e.g. `submissionDate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub field_name: String,
}

impl Dimension {
    pub fn new(field_name: impl Into<String>) -> Self {
        Dimension {
            field_name: field_name.into(),
        }
    }
}

/// Ordered partition dimensions of a source. The order matches the nesting of
/// record groups in storage (first dimension is the outermost level).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSchema {
    #[serde(default)]
    dimensions: Vec<Dimension>,
}

impl PartitionSchema {
    pub fn new(dimensions: Vec<Dimension>) -> Self {
        PartitionSchema { dimensions }
    }

    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PartitionSchema::new(fields.into_iter().map(Dimension::new).collect())
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.field_name.as_str())
    }

    pub fn is_dimension(&self, field: &str) -> bool {
        self.field_names().any(|name| name == field)
    }

    /// Serialize the schema to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
