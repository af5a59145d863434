//! Typed error enums for the service layer.

use dqbot_llm::LlmError;
use dqbot_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying storage, LLM, and aggregation failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (assertion files, history table).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// LLM API call failed.
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    /// History append stopped part-way.
    #[error("aggregation: {0}")]
    Aggregation(#[from] AggregationError),

    /// A blocking task panicked or was cancelled.
    #[error("task: {0}")]
    Task(String),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Llm(e) => e.is_transient(),
            Self::Aggregation(AggregationError::Append { source, .. }) => source.is_transient(),
            _ => false,
        }
    }
}

/// Failure while appending a run's records to history.
///
/// Records already written stay written.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("history append failed after {written} of {total} records: {source}")]
    Append {
        written: usize,
        total: usize,
        #[source]
        source: StorageError,
    },

    #[error("aggregation task failed: {0}")]
    Task(String),
}

impl AggregationError {
    /// Number of records persisted before the failure.
    #[must_use]
    pub const fn written(&self) -> usize {
        match *self {
            Self::Append { written, .. } => written,
            Self::Task(_) => 0,
        }
    }
}

/// Failure of a chat turn that leaves the session untouched.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Generation failed or timed out; the turn may be retried.
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}

impl GatewayError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Generation(LlmError::Timeout(_)))
    }
}
