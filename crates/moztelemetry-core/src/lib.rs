//! moztelemetry core: criteria, engine traits, source descriptors, config and errors
//! (no Polars dependency).

pub mod config;
pub mod engine;
pub mod error;
pub mod predicate;
pub mod schema;
pub mod source;
pub mod selection;

pub use config::TelemetryConfig;
pub use engine::{
    GroupedRecord, Record, RecordStream, ScanEngine, ScanItem, ScanRequest, Summary,
};
pub use error::{DatasetError, EngineError, PredicateError};
pub use predicate::{Criteria, Predicate};
pub use schema::{Dimension, PartitionSchema};
pub use selection::Selection;
pub use source::SourceConfig;
