//! Error types for the scoring dispatcher

use benchjudge_core::BenchError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors raised while preparing or running an evaluation
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Invalid request or configuration, raised before any record is written
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A required record does not exist or is not visible to the caller
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    /// The judge model call failed
    #[error("Judge error: {0}")]
    Judge(String),

    /// A judge call did not finish within the job timeout
    #[error("Judge call {trace_id} timed out after {after:?}")]
    Timeout { trace_id: String, after: Duration },
}

impl From<BenchError> for DispatchError {
    fn from(err: BenchError) -> Self {
        match err {
            BenchError::NotFound(what) => DispatchError::NotFound(what),
            BenchError::Config(msg) => DispatchError::Config(msg),
            BenchError::Model(msg) => DispatchError::Judge(msg),
            other => DispatchError::Store(other.to_string()),
        }
    }
}
