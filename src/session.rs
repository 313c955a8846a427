//! Session: the entry point that ties an engine to a catalog of sources.

use std::sync::Arc;

use moztelemetry_core::engine::ScanEngine;
use moztelemetry_core::source::SourceConfig;

use crate::config::TelemetryConfig;
use crate::dataset::Dataset;
use crate::engine::{InMemoryEngine, LocalEngine};
use crate::error::DatasetError;
use crate::source::SourceCatalog;

/// Builder for creating a TelemetrySession with configuration options
#[derive(Clone, Default)]
pub struct TelemetrySessionBuilder {
    app_name: Option<String>,
    engine: Option<Arc<dyn ScanEngine>>,
    catalog: SourceCatalog,
    default_max_concurrency: Option<usize>,
    default_source: Option<String>,
}

impl TelemetrySessionBuilder {
    pub fn new() -> Self {
        TelemetrySessionBuilder::default()
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn ScanEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn source(mut self, source: SourceConfig) -> Self {
        self.catalog = self.catalog.with_source(source);
        self
    }

    pub fn sources(mut self, catalog: SourceCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Concurrency hint for datasets that set none. `0` leaves it unset.
    pub fn default_max_concurrency(mut self, n: usize) -> Self {
        self.default_max_concurrency = (n > 0).then_some(n);
        self
    }

    /// Apply configuration from a [`TelemetryConfig`]. Loads the sources catalog
    /// and selects a [`LocalEngine`] when the config names them.
    pub fn with_config(mut self, config: &TelemetryConfig) -> Result<Self, DatasetError> {
        if let Some(path) = &config.sources_path {
            self.catalog = SourceCatalog::from_path(path)?;
        }
        if let Some(root) = &config.local_root {
            self.engine = Some(Arc::new(LocalEngine::new(root.clone())));
        }
        self.default_max_concurrency = config.default_max_concurrency;
        self.default_source = Some(config.default_source.clone());
        Ok(self)
    }

    /// Without an explicit engine the session reads from an empty in-memory engine.
    pub fn get_or_create(self) -> TelemetrySession {
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(InMemoryEngine::new()));
        tracing::info!(
            app_name = self.app_name.as_deref().unwrap_or("moztelemetry"),
            sources = self.catalog.names().count(),
            "telemetry session created"
        );
        TelemetrySession {
            app_name: self.app_name,
            engine,
            catalog: Arc::new(self.catalog),
            default_max_concurrency: self.default_max_concurrency,
            default_source: self
                .default_source
                .unwrap_or_else(|| crate::config::DEFAULT_SOURCE.to_string()),
        }
    }
}

/// Main entry point for creating datasets.
#[derive(Clone)]
pub struct TelemetrySession {
    app_name: Option<String>,
    engine: Arc<dyn ScanEngine>,
    catalog: Arc<SourceCatalog>,
    default_max_concurrency: Option<usize>,
    default_source: String,
}

impl TelemetrySession {
    pub fn builder() -> TelemetrySessionBuilder {
        TelemetrySessionBuilder::new()
    }

    /// Session configured from environment variables (see [`TelemetryConfig::load`]).
    pub fn from_config(config: &TelemetryConfig) -> Result<TelemetrySession, DatasetError> {
        Ok(Self::builder().with_config(config)?.get_or_create())
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn engine(&self) -> Arc<dyn ScanEngine> {
        Arc::clone(&self.engine)
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn default_source(&self) -> &str {
        &self.default_source
    }

    pub fn default_max_concurrency(&self) -> Option<usize> {
        self.default_max_concurrency
    }

    /// Dataset over a source described inline.
    pub fn from_source(&self, source: SourceConfig) -> Result<Dataset, DatasetError> {
        Ok(Dataset::from_source(self.engine(), source)?
            .with_default_concurrency(self.default_max_concurrency))
    }

    /// Dataset over a named source from the session's catalog.
    pub fn dataset(&self, name: &str) -> Result<Dataset, DatasetError> {
        let source = self.catalog.get(name)?.clone();
        self.from_source(source)
    }
}

impl Default for TelemetrySession {
    fn default() -> Self {
        Self::builder().get_or_create()
    }
}
