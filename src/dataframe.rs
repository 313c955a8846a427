use std::fmt;
use std::sync::Arc;

use polars::prelude::{Column as PlColumn, DataFrame as PlDataFrame, NamedFrom, PolarsError, Series};
use serde_json::Value as JsonValue;

use crate::engine::Record;

/// DataFrame - tabular view of materialized records.
/// Thin wrapper around an eager Polars `DataFrame`.
pub struct DataFrame {
    df: Arc<PlDataFrame>,
}

impl DataFrame {
    /// Create a new DataFrame from a Polars DataFrame
    pub fn from_polars(df: PlDataFrame) -> Self {
        DataFrame { df: Arc::new(df) }
    }

    /// Create an empty DataFrame
    pub fn empty() -> Self {
        DataFrame {
            df: Arc::new(PlDataFrame::empty()),
        }
    }

    /// Build a frame from records. `columns` fixes the column set and order;
    /// otherwise it is the union of top-level keys in first-seen order.
    pub fn from_records(records: &[Record], columns: Option<&[String]>) -> Result<Self, PolarsError> {
        let names: Vec<String> = match columns {
            Some(cols) => cols.to_vec(),
            None => {
                let mut seen: Vec<String> = Vec::new();
                for record in records {
                    for key in record.keys() {
                        if !seen.contains(key) {
                            seen.push(key.clone());
                        }
                    }
                }
                seen
            }
        };
        if names.is_empty() {
            return Ok(DataFrame::empty());
        }
        let columns: Vec<PlColumn> = names
            .iter()
            .map(|name| {
                let values: Vec<Option<&JsonValue>> = records
                    .iter()
                    .map(|r| r.get(name).filter(|v| !v.is_null()))
                    .collect();
                json_series(name, &values).into()
            })
            .collect();
        Ok(DataFrame::from_polars(PlDataFrame::new(columns)?))
    }

    /// Get column names
    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Number of rows
    pub fn count(&self) -> usize {
        self.df.height()
    }

    /// The materialized Polars DataFrame
    pub fn collect(&self) -> Arc<PlDataFrame> {
        self.df.clone()
    }
}

impl fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.df.as_ref(), f)
    }
}

impl Clone for DataFrame {
    fn clone(&self) -> Self {
        DataFrame {
            df: self.df.clone(),
        }
    }
}

/// Pick the narrowest column type that holds every non-null value: bool, i64,
/// f64, then string. Nested values are rendered as JSON text.
fn json_series(name: &str, values: &[Option<&JsonValue>]) -> Series {
    let present = || values.iter().flatten();
    let all_null = present().next().is_none();
    if !all_null && present().all(|v| v.is_boolean()) {
        let col: Vec<Option<bool>> = values.iter().map(|v| v.and_then(JsonValue::as_bool)).collect();
        return Series::new(name.into(), col);
    }
    if !all_null && present().all(|v| v.is_i64()) {
        let col: Vec<Option<i64>> = values.iter().map(|v| v.and_then(JsonValue::as_i64)).collect();
        return Series::new(name.into(), col);
    }
    if !all_null && present().all(|v| v.is_number()) {
        let col: Vec<Option<f64>> = values.iter().map(|v| v.and_then(JsonValue::as_f64)).collect();
        return Series::new(name.into(), col);
    }
    let col: Vec<Option<String>> = values
        .iter()
        .map(|v| {
            v.map(|v| match v {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .collect();
    Series::new(name.into(), col)
}
