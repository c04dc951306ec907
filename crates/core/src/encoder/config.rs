//! Configuration for the encoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the `flac` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path to flac binary.
    #[serde(default = "default_flac_path")]
    pub flac_path: PathBuf,

    /// Verify the encoded stream before overwriting the original (`-V`).
    #[serde(default = "default_true")]
    pub verify: bool,

    /// Silence the encoder's progress output (`-s`).
    #[serde(default = "default_true")]
    pub silent: bool,

    /// Timeout for a single file in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_flac_path() -> PathBuf {
    PathBuf::from("flac")
}

fn default_true() -> bool {
    true
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            flac_path: default_flac_path(),
            verify: true,
            silent: true,
            timeout_secs: None,
        }
    }
}

impl EncoderConfig {
    /// Creates a config pointing at a custom flac binary.
    pub fn with_flac_path(flac_path: impl Into<PathBuf>) -> Self {
        Self {
            flac_path: flac_path.into(),
            ..Default::default()
        }
    }

    /// Sets whether output verification is requested.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Sets the per-file timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// The per-file timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
