//! Traits for idiomatic conversion out of a [`Dataset`].

use moztelemetry_core::engine::{Record, Summary};

use crate::dataframe::DataFrame;
use crate::dataset::Dataset;
use crate::error::DatasetError;

/// Materialize a [`Dataset`] into a value. Used through [`Dataset::collect`].
pub trait FromDataset {
    fn from_dataset(dataset: &Dataset) -> Result<Self, DatasetError>
    where
        Self: Sized;
}

impl FromDataset for Vec<Record> {
    fn from_dataset(dataset: &Dataset) -> Result<Self, DatasetError> {
        dataset.records()?.collect()
    }
}

impl FromDataset for Vec<Summary> {
    fn from_dataset(dataset: &Dataset) -> Result<Self, DatasetError> {
        dataset.summaries()
    }
}

impl FromDataset for DataFrame {
    fn from_dataset(dataset: &Dataset) -> Result<Self, DatasetError> {
        dataset.dataframe()
    }
}

/// Rows as JSON text, one document per record.
impl FromDataset for Vec<String> {
    fn from_dataset(dataset: &Dataset) -> Result<Self, DatasetError> {
        dataset
            .records()?
            .map(|r| {
                r.and_then(|record| {
                    serde_json::to_string(&record)
                        .map_err(|e| DatasetError::Materialization(e.into()))
                })
            })
            .collect()
    }
}
