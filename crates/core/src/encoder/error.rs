//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while driving a single encoder process.
#[derive(Debug, Error)]
pub enum JobError {
    /// flac binary not found.
    #[error("flac not found at path: {path}")]
    EncoderNotFound { path: PathBuf },

    /// The process could not be spawned for another reason.
    #[error("Failed to spawn encoder for {input}: {source}")]
    Spawn {
        input: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the process failed.
    #[error("Failed to wait on encoder for {input}: {source}")]
    Wait {
        input: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The job was asked to start twice.
    #[error("Job for {input} was already started")]
    AlreadyStarted { input: PathBuf },

    /// The version probe returned something unexpected.
    #[error("Unexpected encoder version output: {output}")]
    UnexpectedVersion { output: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Maps a spawn error, distinguishing a missing binary.
    pub fn spawn(program: &std::path::Path, input: &std::path::Path, e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::EncoderNotFound {
                path: program.to_path_buf(),
            }
        } else {
            Self::Spawn {
                input: input.to_path_buf(),
                source: e,
            }
        }
    }
}
