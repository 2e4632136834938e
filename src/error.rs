//! Error taxonomy for pipeline operations.
//!
//! - `Validation`: a required input is missing or malformed; surfaced to
//!   the caller before any mutation.
//! - `InvalidState`: the requested operation is illegal for the lead's
//!   current state; rejected without side effects.
//! - `Store`: the external persistence call failed after an optimistic
//!   local mutation, which has been rolled back; retryable.
//!
//! A discarded stale store response is deliberately *not* an error; it is
//! reported through [`crate::controller::ReconcileOutcome::StaleDiscarded`].

use thiserror::Error;

use crate::store::StoreError;

/// Error type for stage transitions and controller operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Missing or malformed input, e.g. losing a lead without a reason.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation illegal in the lead's current state, e.g. transitioning
    /// a converted lead or re-entering the current stage.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// External store failure, surfaced after rollback.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Whether retrying the same call can succeed without operator input.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::InvalidState(_) => false,
            Self::Store(err) => err.is_retryable(),
        }
    }
}
