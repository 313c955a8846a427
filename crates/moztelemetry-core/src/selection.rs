//! Projection applied to each materialized record.

use serde_json::Value as JsonValue;

use crate::engine::{Record, lookup_path};

/// Which parts of each record to keep. Never changes the number of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Keep records as stored.
    #[default]
    All,
    /// Keep the given `/`-separated paths; output keys are the paths themselves.
    Fields(Vec<String>),
    /// Keep the given paths under alias names: `(alias, path)`.
    Aliased(Vec<(String, String)>),
}

impl Selection {
    pub fn fields<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Fields(paths.into_iter().map(Into::into).collect())
    }

    pub fn aliased<I, A, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, P)>,
        A: Into<String>,
        P: Into<String>,
    {
        Selection::Aliased(
            pairs
                .into_iter()
                .map(|(a, p)| (a.into(), p.into()))
                .collect(),
        )
    }

    /// Output column names, or `None` when every field is kept.
    pub fn output_names(&self) -> Option<Vec<String>> {
        match self {
            Selection::All => None,
            Selection::Fields(paths) => Some(paths.clone()),
            Selection::Aliased(pairs) => Some(pairs.iter().map(|(a, _)| a.clone()).collect()),
        }
    }

    /// Reshape one record. Missing paths become `null`.
    pub fn apply(&self, record: Record) -> Record {
        match self {
            Selection::All => record,
            Selection::Fields(paths) => project(&record, paths.iter().map(|p| (p, p))),
            Selection::Aliased(pairs) => project(&record, pairs.iter().map(|(a, p)| (a, p))),
        }
    }
}

fn project<'a>(record: &Record, pairs: impl Iterator<Item = (&'a String, &'a String)>) -> Record {
    pairs
        .map(|(name, path)| {
            let value = lookup_path(record, path).cloned().unwrap_or(JsonValue::Null);
            (name.clone(), value)
        })
        .collect()
}
