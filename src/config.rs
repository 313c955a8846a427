//! Configuration for telemetry sessions.
//!
//! Use [`TelemetryConfig`] to configure a session from code or environment variables,
//! then create a session with [`TelemetrySession::from_config`](crate::TelemetrySession::from_config).

pub use moztelemetry_core::TelemetryConfig;
pub use moztelemetry_core::config::{DEFAULT_SOURCE, ENV_PREFIX};
