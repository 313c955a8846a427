//! Engine traits: backend-agnostic scan and summary-scan capabilities.

mod record;
mod scan;

pub use record::{GroupedRecord, Record, Summary, lookup_path};
pub use scan::{RecordStream, ScanEngine, ScanItem, ScanRequest};
