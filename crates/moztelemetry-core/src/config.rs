//! Configuration for telemetry sessions.
//!
//! Use [`TelemetryConfig`] to configure a session from code or environment
//! variables (prefix `MOZTELEMETRY_`), then hand it to the session builder.

use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Environment variable prefix for [`TelemetryConfig::load`].
pub const ENV_PREFIX: &str = "MOZTELEMETRY_";

/// Default name of the source used by ping helpers.
pub const DEFAULT_SOURCE: &str = "telemetry";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Concurrency hint used when a dataset does not set one.
    pub default_max_concurrency: Option<usize>,
    /// JSON catalog of named sources.
    pub sources_path: Option<PathBuf>,
    /// Root directory for the local engine.
    pub local_root: Option<PathBuf>,
    /// Source used by `get_pings`.
    pub default_source: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            default_max_concurrency: None,
            sources_path: None,
            local_root: None,
            default_source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from defaults, then environment variables prefixed with
    /// `MOZTELEMETRY_` (e.g. `MOZTELEMETRY_DEFAULT_MAX_CONCURRENCY=8`).
    pub fn load() -> Result<Self, DatasetError> {
        Self::extract(Self::figment())
    }

    /// Like [`load`](Self::load), falling back to defaults when the environment is invalid.
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid telemetry configuration from environment");
                Self::default()
            }
        }
    }

    /// Base figment (defaults + environment) so callers can layer more providers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(TelemetryConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn extract(figment: Figment) -> Result<Self, DatasetError> {
        let config: TelemetryConfig = figment
            .extract()
            .map_err(|e| DatasetError::configuration(e.to_string()))?;
        if config.default_max_concurrency == Some(0) {
            return Err(DatasetError::configuration(
                "default_max_concurrency must be at least 1",
            ));
        }
        Ok(config)
    }
}
