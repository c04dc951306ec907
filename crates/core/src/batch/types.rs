//! Types for the batch module.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::pool::PoolStats;

/// Process exit codes of a batch run.
pub mod exit_code {
    /// Normal completion.
    pub const SUCCESS: i32 = 0;
    /// Configuration, discovery or internal error.
    pub const ERROR: i32 = 1;
    /// The parallelism argument was not a positive integer.
    pub const INVALID_PARALLELISM: i32 = -1;
    /// A file failed and no operator was there to decide.
    pub const COMMAND_FAILED: i32 = -2;
    /// The operator chose to abort.
    pub const ABORTED: i32 = -3;
    /// The run was interrupted.
    pub const INTERRUPTED: i32 = -4;
}

/// One progress event, emitted when a file is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based position in the batch.
    pub index: usize,
    pub total: usize,
    /// Path relative to the batch root, for display.
    pub relative_path: PathBuf,
}

impl BatchProgress {
    /// Percentage of the batch submitted so far, truncated.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 100;
        }
        self.index * 100 / self.total
    }
}

impl fmt::Display for BatchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total.to_string().len();
        write!(
            f,
            "{:0width$}/{} ({}%): Re-encoding '{}'",
            self.index,
            self.total,
            self.percent(),
            self.relative_path.display(),
            width = width
        )
    }
}

/// Callback invoked for every progress event.
pub type ProgressCallback = Arc<dyn Fn(&BatchProgress) + Send + Sync>;

/// What happened over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Files in the batch.
    pub total: usize,
    /// Files handed to the pool.
    pub submitted: usize,
    /// Most jobs owned at once, measured right after each submission.
    pub peak_jobs: usize,
    /// Counters from the pool.
    pub stats: PoolStats,
    /// Files that failed and were skipped.
    pub skipped: Vec<PathBuf>,
}

/// How a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every file was submitted and every job finished or was skipped.
    Completed(BatchSummary),
    /// The operator aborted after a failure.
    Aborted(BatchSummary),
    /// A file failed with nobody to decide, or the prompt was unavailable.
    Failed { path: Option<PathBuf>, summary: BatchSummary },
    /// An interrupt stopped the run.
    Interrupted(BatchSummary),
}

impl BatchOutcome {
    pub fn summary(&self) -> &BatchSummary {
        match self {
            Self::Completed(summary)
            | Self::Aborted(summary)
            | Self::Interrupted(summary)
            | Self::Failed { summary, .. } => summary,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(_) => exit_code::SUCCESS,
            Self::Aborted(_) => exit_code::ABORTED,
            Self::Failed { .. } => exit_code::COMMAND_FAILED,
            Self::Interrupted(_) => exit_code::INTERRUPTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(index: usize, total: usize) -> BatchProgress {
        BatchProgress {
            index,
            total,
            relative_path: PathBuf::from("Artist/Album/01.flac"),
        }
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            progress(1, 5).to_string(),
            "1/5 (20%): Re-encoding 'Artist/Album/01.flac'"
        );
        assert_eq!(
            progress(5, 5).to_string(),
            "5/5 (100%): Re-encoding 'Artist/Album/01.flac'"
        );
    }

    #[test]
    fn test_progress_index_padding() {
        assert_eq!(
            progress(7, 120).to_string(),
            "007/120 (5%): Re-encoding 'Artist/Album/01.flac'"
        );
        assert_eq!(progress(1, 3).percent(), 33);
    }

    #[test]
    fn test_exit_codes() {
        let summary = BatchSummary::default();
        assert_eq!(BatchOutcome::Completed(summary.clone()).exit_code(), 0);
        assert_eq!(
            BatchOutcome::Aborted(summary.clone()).exit_code(),
            exit_code::ABORTED
        );
        assert_eq!(
            BatchOutcome::Interrupted(summary.clone()).exit_code(),
            exit_code::INTERRUPTED
        );
        assert_eq!(
            BatchOutcome::Failed {
                path: None,
                summary
            }
            .exit_code(),
            exit_code::COMMAND_FAILED
        );
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            exit_code::SUCCESS,
            exit_code::ERROR,
            exit_code::INVALID_PARALLELISM,
            exit_code::COMMAND_FAILED,
            exit_code::ABORTED,
            exit_code::INTERRUPTED,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
