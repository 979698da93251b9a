//! Policy layer error types.

use thiserror::Error;

use crate::store::PolicyStatus;

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors from the policy store and evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// No ready policy exists to evaluate against.
    #[error("no policy is ready for evaluation (store is {status})")]
    NotReady {
        /// The store's state at the time of the request.
        status: PolicyStatus,
    },
}
