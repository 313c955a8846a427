//! Helpers for working with raw pings: property extraction, per-client
//! deduplication and a one-call ping query over the default source.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use moztelemetry_core::engine::{Record, lookup_path};
use moztelemetry_core::predicate::{Predicate, between, eq};
use moztelemetry_core::schema::PartitionSchema;
use moztelemetry_core::selection::Selection;
use moztelemetry_core::source::SourceConfig;

use crate::config::DEFAULT_SOURCE;
use crate::dataset::Dataset;
use crate::error::DatasetError;
use crate::session::TelemetrySession;

/// Partition dimensions of the default `telemetry` source, outermost first.
pub const PING_DIMENSIONS: [&str; 6] = [
    "submissionDate",
    "docType",
    "appName",
    "appUpdateChannel",
    "appVersion",
    "appBuildId",
];

/// Bucket and prefix of the telemetry-2 ping store.
pub const TELEMETRY_BUCKET: &str = "net-mozaws-prod-us-west-2-pipeline-data";
pub const TELEMETRY_PREFIX: &str = "telemetry-2";

/// Built-in layout of the `telemetry` source. [`get_pings`] uses it when the
/// session catalog has no entry of that name.
pub fn telemetry_source() -> SourceConfig {
    SourceConfig::new(DEFAULT_SOURCE, TELEMETRY_BUCKET, TELEMETRY_PREFIX)
        .with_schema(PartitionSchema::from_fields(PING_DIMENSIONS))
}

/// Format used for `submissionDate` partition values.
const SUBMISSION_DATE_FORMAT: &str = "%Y%m%d";

/// Accepted values for one dimension of a [`PingQuery`]. In JSON: a string,
/// a `[lo, hi]` pair, or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Exact(String),
    /// Inclusive range.
    Range(String, String),
    /// No restriction (`*`).
    #[default]
    Any,
}

impl Filter {
    fn predicate(&self) -> Option<Predicate> {
        match self {
            Filter::Any => None,
            Filter::Exact(v) if v == "*" => None,
            Filter::Exact(v) => Some(eq(v.as_str())),
            Filter::Range(lo, hi) => Some(between(lo.as_str(), hi.as_str())),
        }
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Filter::Exact(value.to_string())
    }
}

impl From<(&str, &str)> for Filter {
    fn from((lo, hi): (&str, &str)) -> Self {
        Filter::Range(lo.to_string(), hi.to_string())
    }
}

/// Parameters of [`get_pings`]. Every filter defaults to "any".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PingQuery {
    pub doc_type: Filter,
    pub app: Filter,
    pub channel: Filter,
    pub version: Filter,
    pub build_id: Filter,
    pub submission_date: Filter,
    /// Fraction of record groups to read, in `(0, 1]`.
    pub fraction: Option<f64>,
    pub seed: u64,
}

impl PingQuery {
    pub fn new() -> Self {
        PingQuery::default()
    }

    pub fn doc_type(mut self, filter: impl Into<Filter>) -> Self {
        self.doc_type = filter.into();
        self
    }

    pub fn app(mut self, filter: impl Into<Filter>) -> Self {
        self.app = filter.into();
        self
    }

    pub fn channel(mut self, filter: impl Into<Filter>) -> Self {
        self.channel = filter.into();
        self
    }

    pub fn version(mut self, filter: impl Into<Filter>) -> Self {
        self.version = filter.into();
        self
    }

    pub fn build_id(mut self, filter: impl Into<Filter>) -> Self {
        self.build_id = filter.into();
        self
    }

    pub fn submission_date(mut self, filter: impl Into<Filter>) -> Self {
        self.submission_date = filter.into();
        self
    }

    /// Submission date range from calendar dates.
    pub fn submitted_between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.submission_date = Filter::Range(
            start.format(SUBMISSION_DATE_FORMAT).to_string(),
            end.format(SUBMISSION_DATE_FORMAT).to_string(),
        );
        self
    }

    pub fn fraction(mut self, fraction: f64, seed: u64) -> Self {
        self.fraction = Some(fraction);
        self.seed = seed;
        self
    }

    fn filters(&self) -> [(&'static str, &Filter); 6] {
        [
            ("submissionDate", &self.submission_date),
            ("docType", &self.doc_type),
            ("appName", &self.app),
            ("appUpdateChannel", &self.channel),
            ("appVersion", &self.version),
            ("appBuildId", &self.build_id),
        ]
    }

    /// Apply this query to a dataset without materializing it.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset, DatasetError> {
        let predicates: Vec<(&str, Predicate)> = self
            .filters()
            .into_iter()
            .filter_map(|(field, f)| f.predicate().map(|p| (field, p)))
            .collect();
        let narrowed = dataset.where_(predicates)?;
        match self.fraction {
            Some(fraction) => narrowed.sample(fraction, self.seed),
            None => Ok(narrowed),
        }
    }
}

/// Fetch pings from the session's default source. A catalog entry takes
/// precedence over the built-in [`telemetry_source`].
pub fn get_pings(session: &TelemetrySession, query: &PingQuery) -> Result<Vec<Record>, DatasetError> {
    let name = session.default_source();
    let source = match session.catalog().get(name) {
        Ok(source) => source.clone(),
        Err(_) if name == DEFAULT_SOURCE => telemetry_source(),
        Err(e) => return Err(e),
    };
    let dataset = query.apply(&session.from_source(source)?)?;
    let pings: Vec<Record> = dataset.records()?.collect::<Result<_, _>>()?;
    tracing::info!(pings = pings.len(), "fetched pings");
    Ok(pings)
}

/// Project each ping onto `/`-separated property paths. Output keys are the
/// paths; missing properties are `null`.
pub fn get_pings_properties<I, S>(pings: I, paths: &[S]) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
    S: AsRef<str>,
{
    let selection = Selection::fields(paths.iter().map(|p| p.as_ref().to_string()));
    pings.into_iter().map(|p| selection.apply(p)).collect()
}

/// Like [`get_pings_properties`], with output names chosen by the caller:
/// `(alias, path)` pairs.
pub fn get_pings_properties_aliased<I>(pings: I, aliases: &[(&str, &str)]) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let selection = Selection::aliased(aliases.iter().copied());
    pings.into_iter().map(|p| selection.apply(p)).collect()
}

/// Keep the first ping seen for each `clientId`. Pings without a string
/// `clientId` are dropped.
pub fn get_one_ping_per_client<I>(pings: I) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut seen: HashSet<String> = HashSet::new();
    pings
        .into_iter()
        .filter(|ping| match lookup_path(ping, "clientId") {
            Some(JsonValue::String(id)) => seen.insert(id.clone()),
            _ => false,
        })
        .collect()
}
