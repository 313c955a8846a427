//! Engine-agnostic scan capability. The dataset builder only talks to this trait.

use crate::engine::{GroupedRecord, Summary};
use crate::error::EngineError;
use crate::predicate::Criteria;
use crate::source::SourceConfig;

/// One step of a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanItem {
    /// A group was opened. Emitted once per group, before any of its records,
    /// so empty groups are still reported.
    Group(String),
    Record(GroupedRecord),
}

impl ScanItem {
    pub fn into_record(self) -> Option<GroupedRecord> {
        match self {
            ScanItem::Group(_) => None,
            ScanItem::Record(record) => Some(record),
        }
    }
}

/// Items produced by a scan. Consumed lazily; engines should not read a group
/// before the consumer asks for it.
pub type RecordStream = Box<dyn Iterator<Item = Result<ScanItem, EngineError>> + Send>;

/// What to scan. Criteria here only ever name partition dimensions; record-level
/// predicates are applied by the caller.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub source: SourceConfig,
    pub criteria: Criteria,
    /// Passed through unmodified; engines may use it to size their worker pool.
    pub max_concurrency: Option<usize>,
    /// Restrict the read to these groups (as previously returned by a summary scan).
    pub groups: Option<Vec<Summary>>,
}

impl ScanRequest {
    pub fn new(source: SourceConfig, criteria: Criteria) -> Self {
        ScanRequest {
            source,
            criteria,
            max_concurrency: None,
            groups: None,
        }
    }

    pub fn with_max_concurrency(mut self, n: Option<usize>) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_groups(mut self, groups: Vec<Summary>) -> Self {
        self.groups = Some(groups);
        self
    }
}

/// Backend that lists and reads record groups for a source.
pub trait ScanEngine: Send + Sync {
    /// List the groups matching the request's criteria without reading payloads.
    fn submit_summary_scan(&self, request: &ScanRequest) -> Result<Vec<Summary>, EngineError>;

    /// Read the records of every matching group (or of `request.groups` when set).
    fn submit_scan(&self, request: &ScanRequest) -> Result<RecordStream, EngineError>;
}
