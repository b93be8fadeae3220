//! Error types for the relationship engine.
//!
//! Only caller-supplied invariant violations are fatal. Everything the
//! engine can recover from is reported as a [`Diagnostic`] instead.
//!
//! [`Diagnostic`]: crate::semantic::Diagnostic

use thiserror::Error;

use crate::metadata::SnapshotError;

/// Result type for path operations.
pub type PathResult<T> = Result<T, PathError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors from join path queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// Referenced a table that is not a node of the graph.
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

/// Errors from the engine facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The snapshot violates an invariant and was rejected before processing.
    #[error("invalid schema snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),

    #[error(transparent)]
    Path(#[from] PathError),
}
