//! Error types shared by the dataset builder and scan engines.
//!
//! [`EngineError`] is what a [`ScanEngine`](crate::engine::ScanEngine) reports.
//! [`DatasetError`] is what callers of the query builder see: engine failures
//! surface wrapped in [`DatasetError::Materialization`], except predicate
//! failures which keep their own variant wherever they were evaluated.

use std::io;

/// A predicate was malformed, or a custom predicate failed while evaluating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("predicate error on field `{field}`: {message}")]
pub struct PredicateError {
    pub field: String,
    pub message: String,
}

impl PredicateError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        PredicateError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure raised by a scan engine while listing or reading record groups.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// I/O error (file not found, permission, etc.).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be decoded.
    #[error("decode error in {location}: {message}")]
    Decode { location: String, message: String },

    /// A custom predicate failed while the engine evaluated group criteria.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    /// Source or group does not exist in the engine.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal / compute error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn decode(location: impl Into<String>, message: impl ToString) -> Self {
        EngineError::Decode {
            location: location.into(),
            message: message.to_string(),
        }
    }
}

/// Unified error type for dataset operations.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The source descriptor is missing identity fields or is otherwise invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A predicate is malformed, or a custom predicate failed while evaluating.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    /// Any failure surfaced by the engine during a terminal call.
    #[error("materialization error: {0}")]
    Materialization(EngineError),
}

impl From<EngineError> for DatasetError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Predicate(p) => DatasetError::Predicate(p),
            other => DatasetError::Materialization(other),
        }
    }
}

impl DatasetError {
    pub fn configuration(message: impl Into<String>) -> Self {
        DatasetError::Configuration(message.into())
    }

    pub fn predicate(field: impl Into<String>, message: impl Into<String>) -> Self {
        DatasetError::Predicate(PredicateError::new(field, message))
    }

    /// True when the error came from the engine rather than the builder.
    pub fn is_materialization(&self) -> bool {
        matches!(self, DatasetError::Materialization(_))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Internal(e.to_string())
    }
}
