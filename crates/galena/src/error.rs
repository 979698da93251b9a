//! Engine error types.

use galena_mining::MiningError;
use galena_policy::PolicyError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced synchronously by the engine.
///
/// Faults inside a background mining run are not returned here; they are
/// recorded on the job status and leave the policy store failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A mining job is already running.
    #[error("a mining job is already running")]
    Conflict,

    /// Data loading or parameter validation failed.
    #[error(transparent)]
    Mining(#[from] MiningError),

    /// The policy store refused the operation.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Engine-level inconsistency, such as a panicked worker.
    #[error("internal engine fault: {0}")]
    Internal(String),
}

impl EngineError {
    /// Creates an internal fault with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
