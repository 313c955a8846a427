//! One-stop prelude for application code.
//!
//! Use `use moztelemetry::prelude::*` to get the most common types and functions.
//! For the full API, see the crate root and [`crate::pings`].

pub use crate::config::TelemetryConfig;
pub use crate::dataframe::DataFrame;
pub use crate::dataset::{Dataset, Records};
pub use crate::engine::{InMemoryEngine, LocalEngine, Record, ScanEngine, Summary};
pub use crate::error::{DatasetError, EngineError, PredicateError};
pub use crate::pings::{
    Filter, PingQuery, get_one_ping_per_client, get_pings, get_pings_properties,
};
pub use crate::session::{TelemetrySession, TelemetrySessionBuilder};
pub use crate::source::{SourceCatalog, SourceConfig};
pub use crate::traits::FromDataset;
pub use moztelemetry_core::predicate::{
    Criteria, Predicate, at_least, at_most, between, custom, eq, is_in, starts_with,
};
pub use moztelemetry_core::schema::{Dimension, PartitionSchema};
pub use moztelemetry_core::selection::Selection;
