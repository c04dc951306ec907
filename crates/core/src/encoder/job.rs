//! A single in-place re-encode of one file.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::EncoderConfig;
use super::error::JobError;
use super::flac;
use super::types::{ExitInfo, JobId, JobResult};

/// One flac invocation for one input file.
///
/// The job owns the child process from [`Job::start`] until the result turns
/// terminal. On that transition the encoder's temporary sibling is removed,
/// whichever way the process ended.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    input: PathBuf,
    attempt: u32,
    config: Arc<EncoderConfig>,
    child: Option<Child>,
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
    started_at: Option<Instant>,
    result: JobResult,
    cleaned: bool,
}

impl Job {
    /// Creates a job that has not been started yet.
    pub fn new(id: JobId, input: PathBuf, attempt: u32, config: Arc<EncoderConfig>) -> Self {
        Self {
            id,
            input,
            attempt,
            config,
            child: None,
            stdout: None,
            stderr: None,
            started_at: None,
            result: JobResult::Pending,
            cleaned: false,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Last known result. `Pending` until a poll or wait observes termination.
    pub fn result(&self) -> &JobResult {
        &self.result
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Whether a child process is currently held.
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Time since the process was spawned.
    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Path of the temporary file flac writes for this input.
    pub fn temp_path(&self) -> PathBuf {
        flac::temp_path(&self.input)
    }

    /// Spawns the encoder.
    ///
    /// A spawn failure leaves the job terminal with a `Failed` result so that
    /// it goes through recovery like any other encoder failure.
    pub fn start(&mut self) -> Result<(), JobError> {
        if self.started_at.is_some() {
            return Err(JobError::AlreadyStarted {
                input: self.input.clone(),
            });
        }

        let args = flac::build_args(&self.config, &self.input);
        debug!(
            "Starting job {} (attempt {}): {} {:?}",
            self.id,
            self.attempt,
            self.config.flac_path.display(),
            args
        );

        self.started_at = Some(Instant::now());

        let mut command = Command::new(&self.config.flac_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group: a terminal Ctrl-C reaches reflac only, and running
        // encoders are left to finish.
        #[cfg(unix)]
        command.process_group(0);
        let spawned = command.spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let err = JobError::spawn(&self.config.flac_path, &self.input, e);
                self.result = JobResult::Failed(ExitInfo {
                    code: None,
                    stdout: String::new(),
                    stderr: err.to_string(),
                });
                return Err(err);
            }
        };

        self.stdout = child.stdout.take().map(capture);
        self.stderr = child.stderr.take().map(capture);
        self.child = Some(child);
        Ok(())
    }

    /// Non-blocking check for termination.
    ///
    /// Returns `Pending` while the encoder runs. Once the configured timeout
    /// is exceeded the process is killed and the result is `TimedOut`.
    pub async fn poll(&mut self) -> JobResult {
        if self.result.is_terminal() {
            return self.settled().await;
        }

        let Some(child) = self.child.as_mut() else {
            return JobResult::Pending;
        };

        match child.try_wait() {
            Ok(Some(status)) => self.finish(status).await,
            Ok(None) if self.is_timed_out() => self.kill_timed_out().await,
            Ok(None) => JobResult::Pending,
            Err(e) => self.finish_with_error(e).await,
        }
    }

    /// Blocks until the encoder terminates, then cleans up.
    pub async fn wait(&mut self) -> JobResult {
        if self.result.is_terminal() {
            return self.settled().await;
        }

        let remaining = self.remaining();
        let Some(child) = self.child.as_mut() else {
            return JobResult::Pending;
        };

        let waited = match remaining {
            Some(remaining) => tokio::time::timeout(remaining, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let Some(status) = waited else {
            return self.kill_timed_out().await;
        };

        match status {
            Ok(status) => self.finish(status).await,
            Err(e) => self.finish_with_error(e).await,
        }
    }

    /// Removes the encoder's temporary file if it is still there.
    ///
    /// Safe to call any number of times. Only ever touches [`Job::temp_path`].
    /// Returns whether a file was removed.
    pub async fn cleanup(&self) -> bool {
        let temp = self.temp_path();
        match tokio::fs::remove_file(&temp).await {
            Ok(()) => {
                debug!("Removed leftover temporary file '{}'", temp.display());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(
                    "Failed to remove temporary file '{}': {}",
                    temp.display(),
                    e
                );
                false
            }
        }
    }

    /// Interprets the exit status of a terminated process.
    async fn finish(&mut self, status: ExitStatus) -> JobResult {
        let (stdout, stderr) = self.collect_output().await;
        let info = ExitInfo {
            code: status.code(),
            stdout,
            stderr,
        };

        let result = if status.success() {
            let output = info.combined_output();
            if output.is_empty() {
                debug!(
                    "Job {} finished '{}' in {:?}",
                    self.id,
                    self.input.display(),
                    self.elapsed()
                );
            } else if flac::is_benign(&output) {
                info!("'{}': {}", self.input.display(), output);
            } else if self.config.silent {
                warn!(
                    "Output was not empty for '{}': {}",
                    self.input.display(),
                    output
                );
            } else {
                debug!("Encoder output for '{}':\n{}", self.input.display(), output);
            }
            JobResult::Succeeded
        } else {
            error!("Encoder failed for '{}': {}", self.input.display(), info);
            JobResult::Failed(info)
        };

        self.complete(result).await
    }

    async fn finish_with_error(&mut self, e: std::io::Error) -> JobResult {
        let err = JobError::Wait {
            input: self.input.clone(),
            source: e,
        };
        error!("{}", err);
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
        let (stdout, _) = self.collect_output().await;
        self.complete(JobResult::Failed(ExitInfo {
            code: None,
            stdout,
            stderr: err.to_string(),
        }))
        .await
    }

    async fn kill_timed_out(&mut self) -> JobResult {
        let after = self.elapsed();
        warn!(
            "Job {} for '{}' timed out after {:?}, killing encoder",
            self.id,
            self.input.display(),
            after
        );
        if let Some(child) = self.child.as_mut() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill encoder for '{}': {}", self.input.display(), e);
            }
        }
        self.collect_output().await;
        self.complete(JobResult::TimedOut { after }).await
    }

    /// Terminal transition: drop the process handle and clean up once.
    async fn complete(&mut self, result: JobResult) -> JobResult {
        self.child = None;
        self.result = result;
        self.settled().await
    }

    async fn settled(&mut self) -> JobResult {
        if !self.cleaned {
            self.cleanup().await;
            self.cleaned = true;
        }
        self.result.clone()
    }

    async fn collect_output(&mut self) -> (String, String) {
        let stdout = join_capture(self.stdout.take()).await;
        let stderr = join_capture(self.stderr.take()).await;
        (stdout, stderr)
    }

    fn is_timed_out(&self) -> bool {
        self.config
            .timeout()
            .is_some_and(|timeout| self.elapsed() >= timeout)
    }

    fn remaining(&self) -> Option<Duration> {
        self.config
            .timeout()
            .map(|timeout| timeout.saturating_sub(self.elapsed()))
    }
}

/// Drains a child pipe on a background task so the encoder never blocks on it.
fn capture<R>(mut reader: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn join_capture(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}
