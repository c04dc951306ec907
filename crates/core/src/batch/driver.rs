//! Batch driver: feeds files to the pool under the parallelism ceiling.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::pool::{Decision, JobPool, PoolConfig, PoolError};

use super::types::{BatchOutcome, BatchProgress, BatchSummary, ProgressCallback};

/// Runs a batch of files through a [`JobPool`].
///
/// Files are submitted in order. Before each submission the driver waits
/// until fewer than `ceiling` jobs are owned, sweeping the pool and sleeping
/// `poll_interval` between sweeps that reap nothing. With a ceiling of 1 it
/// waits on the single job directly instead. Once every file is submitted,
/// the remaining jobs are reaped the same way, recovery included.
///
/// Cancellation is checked at every suspension point. Once cancelled, no new
/// file is submitted and every running job is waited on and cleaned up;
/// processes are never killed.
pub struct BatchDriver {
    pool: JobPool,
    ceiling: usize,
    poll_interval: Duration,
    root: Option<PathBuf>,
    progress: Option<ProgressCallback>,
    peak_jobs: usize,
}

impl BatchDriver {
    /// Creates a driver around `pool` using the ceiling and sweep interval
    /// from `config`.
    pub fn new(pool: JobPool, config: &PoolConfig) -> Self {
        Self {
            pool,
            ceiling: config.jobs.max(1),
            poll_interval: config.poll_interval(),
            root: None,
            progress: None,
            peak_jobs: 0,
        }
    }

    /// Progress lines show paths relative to `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets the progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn pool(&self) -> &JobPool {
        &self.pool
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Runs the batch to completion, abort or interruption.
    ///
    /// Only orchestration bugs (pool consistency errors) are returned as
    /// errors; every other ending is a [`BatchOutcome`].
    pub async fn run(
        &mut self,
        files: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, PoolError> {
        let total = files.len();
        info!(
            "Re-encoding {} file(s) with up to {} parallel job(s)",
            total, self.ceiling
        );

        let mut submitted = 0;
        for (i, path) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(self.interrupt(total, submitted).await);
            }

            self.report(i + 1, total, path);
            self.pool.start(path);
            submitted += 1;
            self.peak_jobs = self.peak_jobs.max(self.pool.size());

            let admitted = if self.ceiling == 1 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = Self::wait_sequential(&mut self.pool) => Some(result),
                }
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = Self::wait_for_slot(&mut self.pool, self.ceiling, self.poll_interval) => Some(result),
                }
            };

            match admitted {
                None => return Ok(self.interrupt(total, submitted).await),
                Some(Ok(())) => {}
                Some(Err(e)) => return self.stopped(e, total, submitted),
            }
        }

        // Jobs still running go through recovery like any other.
        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = Self::wait_for_slot(&mut self.pool, 1, self.poll_interval) => Some(result),
        };
        match finished {
            None => return Ok(self.interrupt(total, submitted).await),
            Some(Ok(())) => {}
            Some(Err(e)) => return self.stopped(e, total, submitted),
        }
        self.pool.drain().await;

        let summary = self.summary(total, submitted);
        info!(
            "Finished: {} succeeded, {} skipped",
            summary.stats.succeeded,
            summary.skipped.len()
        );
        Ok(BatchOutcome::Completed(summary))
    }

    /// Blocks on each owned job in turn until the pool is empty. A retry puts
    /// a new job in the pool, which is waited on as well.
    async fn wait_sequential(pool: &mut JobPool) -> Result<(), PoolError> {
        while let Some(id) = pool.job_ids().first().copied() {
            pool.finish(id, true).await?;
        }
        Ok(())
    }

    /// Sweeps until fewer than `ceiling` jobs are owned. A ceiling of 1
    /// reaps every job.
    async fn wait_for_slot(
        pool: &mut JobPool,
        ceiling: usize,
        poll_interval: Duration,
    ) -> Result<(), PoolError> {
        while pool.size() >= ceiling {
            if !pool.poll_all().await? {
                tokio::time::sleep(poll_interval).await;
            }
        }
        Ok(())
    }

    async fn interrupt(&mut self, total: usize, submitted: usize) -> BatchOutcome {
        warn!(
            "Interrupted, waiting for {} running job(s) before exiting",
            self.pool.size()
        );
        self.pool.drain().await;

        // An abort or failure that was draining when the interrupt arrived
        // keeps its own outcome.
        let summary = self.summary(total, submitted);
        match self.pool.stopping() {
            Some((Decision::Abort, _)) => BatchOutcome::Aborted(summary),
            Some((Decision::Fail, path)) => BatchOutcome::Failed {
                path: Some(path.to_path_buf()),
                summary,
            },
            _ => BatchOutcome::Interrupted(summary),
        }
    }

    fn stopped(
        &self,
        e: PoolError,
        total: usize,
        submitted: usize,
    ) -> Result<BatchOutcome, PoolError> {
        let summary = self.summary(total, submitted);
        match e {
            PoolError::Aborted => Ok(BatchOutcome::Aborted(summary)),
            PoolError::Unrecoverable { path, reason } => {
                error!("{}", reason);
                Ok(BatchOutcome::Failed {
                    path: Some(path),
                    summary,
                })
            }
            PoolError::Recovery(err) => {
                error!("Cannot resolve failure: {}", err);
                Ok(BatchOutcome::Failed {
                    path: None,
                    summary,
                })
            }
            other => Err(other),
        }
    }

    fn report(&self, index: usize, total: usize, path: &Path) {
        let relative_path = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
            .to_path_buf();
        let progress = BatchProgress {
            index,
            total,
            relative_path,
        };
        debug!("{}", progress);
        if let Some(callback) = &self.progress {
            callback(&progress);
        }
    }

    fn summary(&self, total: usize, submitted: usize) -> BatchSummary {
        BatchSummary {
            total,
            submitted,
            peak_jobs: self.peak_jobs,
            stats: self.pool.stats().clone(),
            skipped: self.pool.skipped().to_vec(),
        }
    }
}
