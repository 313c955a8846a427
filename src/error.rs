//! Error types for embedders.
//!
//! Re-exports the core taxonomy and maps Polars errors into it, so callers never
//! need to depend on Polars error types.

use polars::error::PolarsError;

pub use moztelemetry_core::error::{DatasetError, EngineError, PredicateError};

/// Map a PolarsError raised while building a frame to a materialization failure.
pub fn polars_to_dataset_error(e: PolarsError) -> DatasetError {
    let msg = e.to_string();
    let engine = match &e {
        PolarsError::ColumnNotFound(_) => EngineError::NotFound(msg),
        PolarsError::IO { .. } => EngineError::Internal(format!("io: {msg}")),
        _ => EngineError::Internal(msg),
    };
    DatasetError::Materialization(engine)
}
