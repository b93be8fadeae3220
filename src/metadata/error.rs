//! Query executor error types.

use thiserror::Error;

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors a query executor can report back to the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    /// Query did not finish within the allotted time.
    #[error("query timed out after {0} ms")]
    Timeout(u64),

    /// Database connection failed.
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    /// The query referenced a table or column the backend does not know.
    #[error("unknown object: {0}")]
    UnknownObject(String),

    /// The table is locked or the query was cancelled by the backend.
    #[error("query blocked: {0}")]
    Blocked(String),

    /// The backend returned a row that does not have the expected shape.
    #[error("malformed result row: {0}")]
    MalformedRow(String),

    /// Backend returned an error response.
    #[error("backend error: {message} (code: {code})")]
    Remote {
        /// Backend error code.
        code: String,
        /// Backend error message.
        message: String,
    },
}

impl ExecutorError {
    /// Create a remote error from a backend error code and message.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Blocked(_) | Self::ConnectionFailed(_))
    }
}
