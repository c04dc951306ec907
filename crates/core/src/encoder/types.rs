//! Types shared by the encoder and the pool.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Identifier of a job within a pool. Assigned in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a finished encoder process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitInfo {
    /// Exit code. `None` when the process was killed by a signal or never ran.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ExitInfo {
    /// Stdout and stderr joined and trimmed, for diagnostics.
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code)?,
            None => write!(f, "no exit code")?,
        }
        let output = self.combined_output();
        if !output.is_empty() {
            write!(f, "\n{}", output)?;
        }
        Ok(())
    }
}

/// Result of a job. Everything except `Pending` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// The process has not terminated yet.
    Pending,
    /// Exit code zero.
    Succeeded,
    /// Non-zero exit, signal, or spawn failure.
    Failed(ExitInfo),
    /// Exceeded the configured timeout and was killed.
    TimedOut { after: Duration },
}

impl JobResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Failure details handed to a recovery policy.
#[derive(Debug, Clone)]
pub struct JobFailure {
    pub id: JobId,
    pub input: PathBuf,
    /// 1 for the first run, incremented on every retry.
    pub attempt: u32,
    pub result: JobResult,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (attempt {}) ", self.input.display(), self.attempt)?;
        match &self.result {
            JobResult::Failed(info) => write!(f, "failed with {}", info),
            JobResult::TimedOut { after } => write!(f, "timed out after {:?}", after),
            JobResult::Succeeded | JobResult::Pending => write!(f, "did not fail"),
        }
    }
}
