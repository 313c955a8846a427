//! Catalog of named sources, loaded from a JSON document such as:
//!
//! ```json
//! {
//!   "telemetry": {
//!     "bucket": "telemetry-bucket",
//!     "prefix": "telemetry-2",
//!     "dimensions": [{"field_name": "submissionDate"}, {"field_name": "docType"}]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

pub use moztelemetry_core::SourceConfig;

use crate::error::DatasetError;

#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: BTreeMap<String, SourceConfig>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        SourceCatalog::default()
    }

    /// Parse a catalog. Entry keys become the source names when the entry omits one.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let raw: BTreeMap<String, SourceConfig> = serde_json::from_str(json)
            .map_err(|e| DatasetError::configuration(format!("invalid sources catalog: {e}")))?;
        let mut catalog = SourceCatalog::new();
        for (name, mut source) in raw {
            if source.name.is_empty() {
                source.name = name;
            }
            catalog = catalog.with_source(source);
        }
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DatasetError::configuration(format!(
                "cannot read sources catalog {}: {e}",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), "loaded sources catalog");
        Self::from_json(&text)
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.sources.insert(source.name.clone(), source);
        self
    }

    pub fn get(&self, name: &str) -> Result<&SourceConfig, DatasetError> {
        self.sources.get(name).ok_or_else(|| {
            DatasetError::configuration(format!("unknown source `{name}`"))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}
