//! Error types for the pool module.

use std::path::PathBuf;
use thiserror::Error;

use crate::encoder::JobId;

/// Errors that end a batch. Per-file failures are resolved by the recovery
/// policy and only surface here when they terminate the run.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The operator chose to abort. The pool has been drained.
    #[error("Batch aborted by operator")]
    Aborted,

    /// A non-interactive policy gave up on a file. The pool has been drained.
    #[error("Re-encoding failed for '{}': {reason}", path.display())]
    Unrecoverable { path: PathBuf, reason: String },

    /// The recovery policy could not produce a decision. The pool has been drained.
    #[error("Recovery prompt failed: {0}")]
    Recovery(#[source] std::io::Error),

    /// Asked to finish a job the pool does not own.
    #[error("Job {0} is not owned by this pool")]
    NotOwned(JobId),

    /// Internal bookkeeping no longer adds up.
    #[error("Pool invariant violated: {0}")]
    Inconsistent(String),
}

impl PoolError {
    /// Creates a new inconsistency error.
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::Inconsistent(reason.into())
    }

    /// Whether this error points to a bug in the orchestration itself.
    pub fn is_consistency_error(&self) -> bool {
        matches!(self, Self::NotOwned(_) | Self::Inconsistent(_))
    }
}
