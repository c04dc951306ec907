//! Configuration for file discovery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Vendor string written by the flac release the library is brought up to.
pub const DEFAULT_VENDOR_STRING: &str = "reference libFLAC 1.3.1 20141125";

/// Where to look for files and which ones to pick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Root folder, searched recursively.
    #[serde(default = "default_folder")]
    pub folder: PathBuf,

    /// Glob matched against file names.
    #[serde(default = "default_mask")]
    pub mask: String,

    /// Skip files whose vendor tag already equals `vendor_string`.
    #[serde(default)]
    pub check_vendor: bool,

    /// Vendor string considered up to date.
    #[serde(default = "default_vendor_string")]
    pub vendor_string: String,

    /// Path to metaflac binary.
    #[serde(default = "default_metaflac_path")]
    pub metaflac_path: PathBuf,
}

fn default_folder() -> PathBuf {
    PathBuf::from(".")
}

fn default_mask() -> String {
    "*.flac".to_string()
}

fn default_vendor_string() -> String {
    DEFAULT_VENDOR_STRING.to_string()
}

fn default_metaflac_path() -> PathBuf {
    PathBuf::from("metaflac")
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            mask: default_mask(),
            check_vendor: false,
            vendor_string: default_vendor_string(),
            metaflac_path: default_metaflac_path(),
        }
    }
}

impl DiscoveryConfig {
    /// Searches `folder` with the default mask.
    pub fn with_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            ..Default::default()
        }
    }

    /// Sets the file name mask.
    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = mask.into();
        self
    }
}
