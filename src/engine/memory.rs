//! In-memory scan engine. Holds record groups per source; used for tests and
//! for small datasets assembled in code.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::Value as JsonValue;

use moztelemetry_core::engine::{
    GroupedRecord, Record, RecordStream, ScanEngine, ScanItem, ScanRequest, Summary,
};
use moztelemetry_core::error::EngineError;

#[derive(Debug, Clone)]
struct MemoryGroup {
    summary: Summary,
    records: Vec<Record>,
}

/// Engine backed by record groups held in memory.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    sources: HashMap<String, Vec<MemoryGroup>>,
    failing: HashSet<String>,
    hints: Mutex<Vec<Option<usize>>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        InMemoryEngine::default()
    }

    /// Register an (initially empty) source so scans over it succeed.
    pub fn with_source(mut self, source: &str) -> Self {
        self.sources.entry(source.to_string()).or_default();
        self
    }

    /// Add one record group to `source`, tagged with its partition values.
    pub fn with_group(
        mut self,
        source: &str,
        key: &str,
        dimensions: &[(&str, &str)],
        records: Vec<Record>,
    ) -> Self {
        let size = records
            .iter()
            .map(|r| serde_json::to_vec(r).map(|b| b.len() as u64).unwrap_or(0))
            .sum();
        let mut summary = Summary::new(key, size);
        for (field, value) in dimensions {
            summary
                .dimensions
                .insert(field.to_string(), JsonValue::String(value.to_string()));
        }
        self.sources
            .entry(source.to_string())
            .or_default()
            .push(MemoryGroup { summary, records });
        self
    }

    /// Make every read of group `key` fail with a decode error.
    pub fn with_failing_group(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Concurrency hints received by `submit_scan`, in call order.
    pub fn observed_hints(&self) -> Vec<Option<usize>> {
        self.hints.lock().map(|h| h.clone()).unwrap_or_default()
    }

    fn groups(&self, request: &ScanRequest) -> Result<&[MemoryGroup], EngineError> {
        self.sources
            .get(&request.source.name)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::NotFound(format!("source `{}`", request.source.name)))
    }
}

impl ScanEngine for InMemoryEngine {
    fn submit_summary_scan(&self, request: &ScanRequest) -> Result<Vec<Summary>, EngineError> {
        let mut out = Vec::new();
        for group in self.groups(request)? {
            if request.criteria.matches_dimensions(&group.summary.dimensions)? {
                out.push(group.summary.clone());
            }
        }
        Ok(out)
    }

    fn submit_scan(&self, request: &ScanRequest) -> Result<RecordStream, EngineError> {
        if let Ok(mut hints) = self.hints.lock() {
            hints.push(request.max_concurrency);
        }
        let all = self.groups(request)?;
        let selected: Vec<&MemoryGroup> = match &request.groups {
            Some(wanted) => wanted
                .iter()
                .map(|s| {
                    all.iter()
                        .find(|g| g.summary.key == s.key)
                        .ok_or_else(|| EngineError::NotFound(format!("group `{}`", s.key)))
                })
                .collect::<Result<_, _>>()?,
            None => {
                let mut hits = Vec::new();
                for group in all {
                    if request.criteria.matches_dimensions(&group.summary.dimensions)? {
                        hits.push(group);
                    }
                }
                hits
            }
        };

        let mut items: Vec<Result<ScanItem, EngineError>> = Vec::new();
        for group in selected {
            let key = &group.summary.key;
            items.push(Ok(ScanItem::Group(key.clone())));
            if self.failing.contains(key) {
                items.push(Err(EngineError::decode(key.clone(), "corrupt record group")));
                continue;
            }
            items.extend(group.records.iter().map(|record| {
                Ok(ScanItem::Record(GroupedRecord {
                    group: key.clone(),
                    record: record.clone(),
                }))
            }));
        }
        Ok(Box::new(items.into_iter()))
    }
}
