//! moztelemetry - query builder over partitioned telemetry ping stores.
//!
//! A [`Dataset`] describes which record groups of a source to read and how to
//! filter and reshape their records. Refinements return new datasets; nothing
//! is read until [`Dataset::summaries`], [`Dataset::records`] or
//! [`Dataset::dataframe`] is called.
//!
//! ```no_run
//! use moztelemetry::prelude::*;
//!
//! # fn main() -> Result<(), DatasetError> {
//! let session = TelemetrySession::from_config(&TelemetryConfig::load()?)?;
//! let pings = session
//!     .dataset("telemetry")?
//!     .where_([("docType", eq("main")), ("appUpdateChannel", eq("nightly"))])?
//!     .select(Selection::fields(["clientId", "environment/build/buildId"]))
//!     .records()?;
//! for ping in pings {
//!     println!("{:?}", ping?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataframe;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod pings;
pub mod prelude;
pub mod session;
pub mod source;
pub mod traits;

pub use config::TelemetryConfig;
pub use dataframe::DataFrame;
pub use dataset::{Dataset, Records, Sample};
pub use engine::{InMemoryEngine, LocalEngine};
pub use error::{DatasetError, EngineError, PredicateError};
pub use moztelemetry_core::{
    Criteria, Dimension, GroupedRecord, PartitionSchema, Predicate, Record, RecordStream,
    ScanEngine, ScanItem, ScanRequest, Selection, Summary,
};
pub use moztelemetry_core::predicate;
pub use session::{TelemetrySession, TelemetrySessionBuilder};
pub use source::{SourceCatalog, SourceConfig};
pub use traits::FromDataset;
