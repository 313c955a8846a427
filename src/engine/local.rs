//! Local filesystem scan engine.
//!
//! A source lives under `<root>/<bucket>/<prefix>/`. Each directory level below
//! that maps, in order, to one partition dimension of the source schema, and
//! every `*.json` / `*.jsonl` / `*.ndjson` file at the leaf level is one record
//! group holding one JSON document per line.

use std::collections::VecDeque;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value as JsonValue;
use walkdir::WalkDir;

use moztelemetry_core::engine::{
    GroupedRecord, Record, RecordStream, ScanEngine, ScanItem, ScanRequest, Summary,
};
use moztelemetry_core::error::EngineError;

const GROUP_EXTENSIONS: [&str; 3] = ["json", "jsonl", "ndjson"];

#[derive(Debug, Clone)]
pub struct LocalEngine {
    root: PathBuf,
}

impl LocalEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalEngine { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_dir(&self, request: &ScanRequest) -> PathBuf {
        self.root.join(request.source.location())
    }

    fn key_for(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn list_groups(&self, request: &ScanRequest) -> Result<Vec<Summary>, EngineError> {
        let base = self.source_dir(request);
        if !base.is_dir() {
            return Err(EngineError::NotFound(format!(
                "source directory {}",
                base.display()
            )));
        }
        let dims: Vec<&str> = request.source.schema.field_names().collect();
        let depth = dims.len() + 1;

        let mut out = Vec::new();
        for entry in WalkDir::new(&base)
            .follow_links(false)
            .min_depth(depth)
            .max_depth(depth)
            .sort_by_file_name()
        {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_file() || !is_group_file(entry.path()) {
                continue;
            }
            let rel = entry.path().strip_prefix(&base).unwrap_or(entry.path());
            let size = entry.metadata().map_err(walk_error)?.len();
            let mut summary = Summary::new(self.key_for(entry.path()), size);
            for (dim, part) in dims.iter().zip(rel.components()) {
                summary.dimensions.insert(
                    dim.to_string(),
                    JsonValue::String(part.as_os_str().to_string_lossy().into_owned()),
                );
            }
            if request.criteria.matches_dimensions(&summary.dimensions)? {
                out.push(summary);
            }
        }
        Ok(out)
    }
}

fn walk_error(e: walkdir::Error) -> EngineError {
    EngineError::Io(
        e.into_io_error()
            .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
    )
}

fn read_group(root: &Path, summary: &Summary) -> Result<Vec<GroupedRecord>, EngineError> {
    let file = fs::File::open(root.join(&summary.key))?;
    let mut out = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let location = format!("{}:{}", summary.key, n + 1);
        let record = match serde_json::from_str::<JsonValue>(&line) {
            Ok(JsonValue::Object(map)) => map,
            Ok(other) => {
                return Err(EngineError::decode(
                    location,
                    format!("expected a JSON object, got {other}"),
                ));
            }
            Err(e) => return Err(EngineError::decode(location, e)),
        };
        out.push(GroupedRecord {
            group: summary.key.clone(),
            record,
        });
    }
    Ok(out)
}

/// Reads groups on demand, one pool-wide batch at a time.
struct LocalScan {
    root: PathBuf,
    pending: std::vec::IntoIter<Summary>,
    pool: rayon::ThreadPool,
    batch: usize,
    ready: VecDeque<Result<ScanItem, EngineError>>,
}

impl Iterator for LocalScan {
    type Item = Result<ScanItem, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            let batch: Vec<Summary> = self.pending.by_ref().take(self.batch).collect();
            if batch.is_empty() {
                return None;
            }
            let root = &self.root;
            let reads: Vec<Result<Vec<GroupedRecord>, EngineError>> = self
                .pool
                .install(|| batch.par_iter().map(|g| read_group(root, g)).collect());
            for (summary, read) in batch.into_iter().zip(reads) {
                self.ready.push_back(Ok(ScanItem::Group(summary.key)));
                match read {
                    Ok(records) => self
                        .ready
                        .extend(records.into_iter().map(|r| Ok(ScanItem::Record(r)))),
                    Err(e) => self.ready.push_back(Err(e)),
                }
            }
        }
    }
}

fn is_group_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| GROUP_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

impl ScanEngine for LocalEngine {
    fn submit_summary_scan(&self, request: &ScanRequest) -> Result<Vec<Summary>, EngineError> {
        let groups = self.list_groups(request)?;
        tracing::debug!(
            source = %request.source.name,
            groups = groups.len(),
            "local summary scan"
        );
        Ok(groups)
    }

    fn submit_scan(&self, request: &ScanRequest) -> Result<RecordStream, EngineError> {
        let groups = match &request.groups {
            Some(groups) => groups.clone(),
            None => self.list_groups(request)?,
        };
        let threads = request.max_concurrency.unwrap_or(0);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| EngineError::Internal(format!("cannot start reader pool: {e}")))?;
        tracing::debug!(
            source = %request.source.name,
            groups = groups.len(),
            threads = pool.current_num_threads(),
            "local scan"
        );

        let batch = pool.current_num_threads().max(1);
        let stream = LocalScan {
            root: self.root.clone(),
            pending: groups.into_iter(),
            pool,
            batch,
            ready: VecDeque::new(),
        };
        Ok(Box::new(stream))
    }
}

/// Write records as one JSON-lines group file, creating parent directories.
pub fn write_group(path: impl AsRef<Path>, records: &[Record]) -> Result<(), EngineError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    fs::write(path, body)?;
    Ok(())
}
