//! Mining error types.

use galena_types::SchemaError;
use thiserror::Error;

/// Result type for mining operations.
pub type MiningResult<T> = Result<T, MiningError>;

/// Errors that can occur while loading data or mining rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    /// A threshold parameter is outside its legal range.
    #[error("invalid mining parameter: {0}")]
    InvalidParameter(String),

    /// There is nothing to mine over.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The loaded records do not fit the selected schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The run was cancelled by the caller.
    #[error("mining cancelled")]
    Cancelled,

    /// Unexpected inconsistency discovered mid-scan.
    #[error("internal mining fault: {0}")]
    Internal(String),
}

impl MiningError {
    /// Creates an internal fault with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
