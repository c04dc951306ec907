//! Job pool implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::encoder::{EncoderConfig, Job, JobFailure, JobId, JobResult};

use super::error::PoolError;
use super::recovery::{Decision, RecoveryPolicy};
use super::types::PoolStats;

/// Owns the in-flight jobs of a batch.
///
/// The pool never checks the ceiling itself: the caller compares
/// [`JobPool::size`] with its ceiling before calling [`JobPool::start`].
/// Failed jobs are resolved through the configured [`RecoveryPolicy`].
pub struct JobPool {
    encoder: Arc<EncoderConfig>,
    policy: Box<dyn RecoveryPolicy>,
    jobs: Vec<Job>,
    next_id: u64,
    stats: PoolStats,
    skipped: Vec<PathBuf>,
    stopping: Option<(Decision, PathBuf)>,
}

impl JobPool {
    /// Creates an empty pool.
    pub fn new(encoder: EncoderConfig, policy: Box<dyn RecoveryPolicy>) -> Self {
        Self {
            encoder: Arc::new(encoder),
            policy,
            jobs: Vec::new(),
            next_id: 0,
            stats: PoolStats::default(),
            skipped: Vec::new(),
            stopping: None,
        }
    }

    /// Number of jobs currently owned.
    pub fn size(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Ids of the owned jobs, in submission order.
    pub fn job_ids(&self) -> Vec<JobId> {
        self.jobs.iter().map(Job::id).collect()
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Inputs that failed and were skipped.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// The abort or fail decision the pool is stopping on, with the path that
    /// triggered it. Set before the pool drains, so it survives a drain that
    /// was cut short.
    pub fn stopping(&self) -> Option<(Decision, &Path)> {
        self.stopping
            .as_ref()
            .map(|(decision, path)| (*decision, path.as_path()))
    }

    /// Creates and starts a job for `path`.
    pub fn start(&mut self, path: impl Into<PathBuf>) -> JobId {
        self.start_attempt(path.into(), 1)
    }

    fn start_attempt(&mut self, path: PathBuf, attempt: u32) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;

        let mut job = Job::new(id, path, attempt, Arc::clone(&self.encoder));
        if let Err(e) = job.start() {
            warn!("{}", e);
        }

        self.stats.started += 1;
        self.jobs.push(job);
        id
    }

    /// Reaps the job `id` if it has terminated, or blocks until it does when
    /// `wait` is set.
    ///
    /// Returns `Ok(false)` when the job is still running. A terminated job is
    /// removed from the pool and, if it failed, resolved through the recovery
    /// policy. An abort or unrecoverable failure drains the pool before the
    /// error is returned.
    pub async fn finish(&mut self, id: JobId, wait: bool) -> Result<bool, PoolError> {
        let index = self.position(id)?;

        let result = if wait {
            self.jobs[index].wait().await
        } else {
            self.jobs[index].poll().await
        };

        if !result.is_terminal() {
            if wait {
                return Err(PoolError::inconsistent(format!(
                    "job {} still pending after a blocking wait",
                    id
                )));
            }
            return Ok(false);
        }

        let job = self.remove(index)?;

        if result.is_success() {
            self.stats.succeeded += 1;
            debug!("Job {} done: '{}'", id, job.input().display());
            return Ok(true);
        }

        self.stats.failed += 1;
        let failure = JobFailure {
            id,
            input: job.input().to_path_buf(),
            attempt: job.attempt(),
            result,
        };
        self.recover(failure).await?;
        Ok(true)
    }

    /// Sweeps every owned job once without blocking.
    ///
    /// Returns whether at least one job was reaped.
    pub async fn poll_all(&mut self) -> Result<bool, PoolError> {
        let mut reaped = false;
        for id in self.job_ids() {
            // A recovery decision can drain the pool mid-sweep.
            if self.position(id).is_err() {
                continue;
            }
            if self.finish(id, false).await? {
                reaped = true;
            }
        }
        Ok(reaped)
    }

    /// Waits for every owned job and cleans it up. Failures are logged and
    /// never go through recovery.
    pub async fn drain(&mut self) {
        if self.jobs.is_empty() {
            return;
        }

        info!("Waiting for {} running job(s) to finish...", self.jobs.len());
        // Jobs leave the pool only once waited on, so a drain that is itself
        // cancelled can be resumed.
        while !self.jobs.is_empty() {
            let result = self.jobs[0].wait().await;
            let job = self.jobs.remove(0);
            match result {
                JobResult::Succeeded => {
                    self.stats.succeeded += 1;
                    debug!("Drained job {}: '{}'", job.id(), job.input().display());
                }
                other => {
                    self.stats.failed += 1;
                    warn!(
                        "Drained job {} for '{}' did not succeed: {:?}",
                        job.id(),
                        job.input().display(),
                        other
                    );
                }
            }
            self.stats.drained += 1;
        }
    }

    async fn recover(&mut self, failure: JobFailure) -> Result<(), PoolError> {
        let decision = match self.policy.decide(&failure).await {
            Ok(decision) => decision,
            Err(e) => {
                self.drain().await;
                return Err(PoolError::Recovery(e));
            }
        };

        match decision {
            Decision::Retry => {
                info!("Retrying '{}'", failure.input.display());
                self.stats.retried += 1;
                self.start_attempt(failure.input, failure.attempt + 1);
                Ok(())
            }
            Decision::Skip => {
                info!("Skipping '{}'", failure.input.display());
                self.skipped.push(failure.input);
                Ok(())
            }
            Decision::Abort => {
                warn!("Aborting after failure of '{}'", failure.input.display());
                self.stopping = Some((Decision::Abort, failure.input.clone()));
                self.drain().await;
                Err(PoolError::Aborted)
            }
            Decision::Fail => {
                self.stopping = Some((Decision::Fail, failure.input.clone()));
                self.drain().await;
                Err(PoolError::Unrecoverable {
                    path: failure.input.clone(),
                    reason: failure.to_string(),
                })
            }
        }
    }

    fn position(&self, id: JobId) -> Result<usize, PoolError> {
        self.jobs
            .iter()
            .position(|job| job.id() == id)
            .ok_or(PoolError::NotOwned(id))
    }

    fn remove(&mut self, index: usize) -> Result<Job, PoolError> {
        let before = self.jobs.len();
        let job = self.jobs.remove(index);
        if self.jobs.len() >= before {
            return Err(PoolError::inconsistent(format!(
                "removing job {} did not shrink the pool ({} jobs)",
                job.id(),
                before
            )));
        }
        Ok(job)
    }
}
