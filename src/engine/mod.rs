//! Scan engines shipped with the crate. Any other backend implements
//! [`ScanEngine`](moztelemetry_core::ScanEngine) directly.

mod local;
mod memory;

pub use local::{LocalEngine, write_group};
pub use memory::InMemoryEngine;
pub use moztelemetry_core::engine::{
    GroupedRecord, Record, RecordStream, ScanEngine, ScanItem, ScanRequest, Summary, lookup_path,
};
