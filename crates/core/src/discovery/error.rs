//! Error types for the discovery module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop discovery altogether.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Root folder does not exist.
    #[error("Folder not found: {path}")]
    FolderNotFound { path: PathBuf },

    /// The mask is not a valid glob.
    #[error("Invalid mask '{mask}': {source}")]
    InvalidMask {
        mask: String,
        #[source]
        source: globset::Error,
    },

    /// metaflac binary not found.
    #[error("metaflac not found at path: {path}")]
    MetaflacNotFound { path: PathBuf },

    /// metaflac ran but could not read the file.
    #[error("Failed to read vendor tag of {path}: {reason}")]
    VendorProbeFailed { path: PathBuf, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
