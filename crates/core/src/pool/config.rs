//! Configuration for the job pool.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the job pool and the batch loop around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of encoders running at once.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Sleep between sweeps that reaped nothing, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// What to do when a file fails.
    #[serde(default)]
    pub on_failure: FailureAction,
}

/// Default ceiling: one core left for everything else, never below 1.
pub fn default_jobs() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

fn default_poll_interval() -> u64 {
    100
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            poll_interval_ms: default_poll_interval(),
            on_failure: FailureAction::default(),
        }
    }
}

impl PoolConfig {
    /// Sets the parallelism ceiling.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Sets the sweep interval in milliseconds.
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// How failures are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureAction {
    /// Ask the operator on the terminal.
    #[default]
    Prompt,
    /// Skip the failed file and carry on.
    Skip,
    /// Stop the batch with a failure status.
    Fail,
}

impl FromStr for FailureAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" => Ok(Self::Prompt),
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown failure action '{}' (expected prompt, skip or fail)",
                other
            )),
        }
    }
}

impl fmt::Display for FailureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prompt => "prompt",
            Self::Skip => "skip",
            Self::Fail => "fail",
        };
        f.write_str(name)
    }
}
