//! Types for the pool module.

use serde::Serialize;

/// Counters kept by a pool over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Jobs started, retries included.
    pub started: usize,
    /// Jobs that exited successfully, whether reaped or drained.
    pub succeeded: usize,
    /// Attempts that failed or timed out, drained ones included.
    pub failed: usize,
    /// Attempts re-submitted after a failure.
    pub retried: usize,
    /// Jobs waited on by a drain.
    pub drained: usize,
}
