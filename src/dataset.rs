//! Dataset: an immutable query over a telemetry source.
//!
//! Refinement calls (`where_`, `select`, `limit`, `sample`, `max_concurrency`)
//! only build a new description and never touch the engine. Work happens in the
//! terminal calls: [`Dataset::summaries`], [`Dataset::records`] and
//! [`Dataset::dataframe`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use moztelemetry_core::engine::{
    Record, RecordStream, ScanEngine, ScanItem, ScanRequest, Summary,
};
use moztelemetry_core::predicate::{Criteria, Predicate, between, custom, is_in};
use moztelemetry_core::selection::Selection;
use moztelemetry_core::source::SourceConfig;

use crate::dataframe::DataFrame;
use crate::error::{DatasetError, polars_to_dataset_error};
use crate::traits::FromDataset;

/// Random subset of record groups, reproducible for a given seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub fraction: f64,
    pub seed: u64,
}

#[derive(Clone)]
#[must_use = "datasets do nothing until a terminal call such as .records()"]
pub struct Dataset {
    source: SourceConfig,
    criteria: Criteria,
    selection: Selection,
    limit: Option<usize>,
    max_concurrency: Option<usize>,
    sample: Option<Sample>,
    engine: Arc<dyn ScanEngine>,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("source", &self.source.name)
            .field("criteria", &self.criteria)
            .field("selection", &self.selection)
            .field("limit", &self.limit)
            .field("max_concurrency", &self.max_concurrency)
            .field("sample", &self.sample)
            .finish_non_exhaustive()
    }
}

impl Dataset {
    /// Build a dataset over `source`, read through `engine`.
    pub fn from_source(
        engine: Arc<dyn ScanEngine>,
        source: SourceConfig,
    ) -> Result<Dataset, DatasetError> {
        source.validate()?;
        Ok(Dataset {
            source,
            criteria: Criteria::new(),
            selection: Selection::All,
            limit: None,
            max_concurrency: None,
            sample: None,
            engine,
        })
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Narrow the dataset: every `(field, predicate)` pair is ANDed with the
    /// current criteria. Malformed predicates fail here, not at materialization.
    pub fn where_<I, F, P>(&self, predicates: I) -> Result<Dataset, DatasetError>
    where
        I: IntoIterator<Item = (F, P)>,
        F: AsRef<str>,
        P: Into<Predicate>,
    {
        let mut criteria = self.criteria.clone();
        for (field, predicate) in predicates {
            criteria = criteria.with(field.as_ref(), predicate.into())?;
        }
        Ok(Dataset {
            criteria,
            ..self.clone()
        })
    }

    /// AND a whole criteria set (e.g. one built elsewhere).
    pub fn where_criteria(&self, criteria: &Criteria) -> Dataset {
        Dataset {
            criteria: self.criteria.and(criteria),
            ..self.clone()
        }
    }

    pub fn where_eq(
        &self,
        field: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<Dataset, DatasetError> {
        self.where_([(field, Predicate::Eq(value.into()))])
    }

    pub fn where_in<V>(
        &self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Dataset, DatasetError>
    where
        V: Into<serde_json::Value>,
    {
        self.where_([(field, is_in(values))])
    }

    pub fn where_range(
        &self,
        field: &str,
        lower: impl Into<serde_json::Value>,
        upper: impl Into<serde_json::Value>,
    ) -> Result<Dataset, DatasetError> {
        self.where_([(field, between(lower, upper))])
    }

    /// Filter with a caller-supplied test. An `Err` from the test aborts the
    /// terminal call with a predicate error.
    pub fn where_fn<F>(&self, field: &str, test: F) -> Result<Dataset, DatasetError>
    where
        F: Fn(&serde_json::Value) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.where_([(field, custom(field, test))])
    }

    /// Reshape each record. Replaces any previous selection.
    pub fn select(&self, selection: Selection) -> Dataset {
        Dataset {
            selection,
            ..self.clone()
        }
    }

    /// Read at most `n` record groups.
    pub fn limit(&self, n: usize) -> Dataset {
        Dataset {
            limit: Some(n),
            ..self.clone()
        }
    }

    /// Hint passed to the engine unmodified. Must be at least 1.
    pub fn max_concurrency(&self, n: usize) -> Result<Dataset, DatasetError> {
        if n == 0 {
            return Err(DatasetError::predicate(
                "max_concurrency",
                "must be at least 1",
            ));
        }
        Ok(Dataset {
            max_concurrency: Some(n),
            ..self.clone()
        })
    }

    /// Keep a random `fraction` of record groups, chosen deterministically from `seed`.
    pub fn sample(&self, fraction: f64, seed: u64) -> Result<Dataset, DatasetError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(DatasetError::predicate(
                "sample",
                format!("fraction must be in (0, 1], got {fraction}"),
            ));
        }
        Ok(Dataset {
            sample: Some(Sample { fraction, seed }),
            ..self.clone()
        })
    }

    pub(crate) fn with_default_concurrency(mut self, n: Option<usize>) -> Dataset {
        if self.max_concurrency.is_none() {
            self.max_concurrency = n;
        }
        self
    }

    /// Split criteria into the part the engine prunes groups with and the part
    /// checked against each record.
    fn split_criteria(&self) -> (Criteria, Criteria) {
        self.criteria.split_by(self.source.schema.field_names())
    }

    fn scan_request(&self, criteria: Criteria) -> ScanRequest {
        ScanRequest::new(self.source.clone(), criteria).with_max_concurrency(self.max_concurrency)
    }

    /// Descriptors of the record groups this dataset covers, without reading payloads.
    pub fn summaries(&self) -> Result<Vec<Summary>, DatasetError> {
        let (group_criteria, _) = self.split_criteria();
        let mut groups = self
            .engine
            .submit_summary_scan(&self.scan_request(group_criteria))?;
        groups.sort_by(|a, b| a.key.cmp(&b.key));

        if let Some(sample) = self.sample {
            let keep = (groups.len() as f64 * sample.fraction).floor() as usize;
            let mut rng = StdRng::seed_from_u64(sample.seed);
            groups.shuffle(&mut rng);
            groups.truncate(keep);
            groups.sort_by(|a, b| a.key.cmp(&b.key));
        }
        if let Some(n) = self.limit {
            groups.truncate(n);
        }
        tracing::debug!(
            source = %self.source.name,
            criteria = self.criteria.len(),
            groups = groups.len(),
            "summaries"
        );
        Ok(groups)
    }

    /// Lazily yield the records matching the accumulated criteria.
    pub fn records(&self) -> Result<Records, DatasetError> {
        let groups = self.summaries()?;
        let (group_criteria, record_criteria) = self.split_criteria();
        let request = self.scan_request(group_criteria).with_groups(groups);
        tracing::debug!(
            source = %self.source.name,
            groups = request.groups.as_ref().map_or(0, Vec::len),
            max_concurrency = ?self.max_concurrency,
            "submitting scan"
        );
        let stream = self.engine.submit_scan(&request)?;
        Ok(Records::new(stream, record_criteria, self.selection.clone()))
    }

    /// Materialize into a table. Columns follow the selection when one is set.
    pub fn dataframe(&self) -> Result<DataFrame, DatasetError> {
        let rows: Vec<Record> = self.records()?.collect::<Result<_, _>>()?;
        let columns = self.selection.output_names();
        let df = DataFrame::from_records(&rows, columns.as_deref())
            .map_err(polars_to_dataset_error)?;
        tracing::debug!(rows = df.count(), columns = df.columns().len(), "dataframe");
        Ok(df)
    }

    /// Materialize into any [`FromDataset`] target.
    pub fn collect<T: FromDataset>(&self) -> Result<T, DatasetError> {
        T::from_dataset(self)
    }
}

/// Lazy sequence of records produced by [`Dataset::records`]. Stops after the
/// first error.
pub struct Records {
    stream: RecordStream,
    record_criteria: Criteria,
    selection: Selection,
    groups_read: BTreeSet<String>,
    done: bool,
}

impl Records {
    fn new(stream: RecordStream, record_criteria: Criteria, selection: Selection) -> Self {
        Records {
            stream,
            record_criteria,
            selection,
            groups_read: BTreeSet::new(),
            done: false,
        }
    }

    /// Keys of the record groups opened so far, including groups without records.
    pub fn groups_read(&self) -> &BTreeSet<String> {
        &self.groups_read
    }
}

impl fmt::Debug for Records {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Records")
            .field("record_criteria", &self.record_criteria)
            .field("selection", &self.selection)
            .field("groups_read", &self.groups_read)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Iterator for Records {
    type Item = Result<Record, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let item = match self.stream.next() {
                Some(Ok(ScanItem::Group(key))) => {
                    self.groups_read.insert(key);
                    continue;
                }
                Some(Ok(ScanItem::Record(item))) => item,
                Some(Err(e)) => {
                    self.done = true;
                    tracing::warn!(error = %e, "scan failed");
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };
            match self.record_criteria.matches_record(&item.record) {
                Ok(true) => return Some(Ok(self.selection.apply(item.record))),
                Ok(false) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}
