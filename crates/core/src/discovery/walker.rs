//! Recursive file search.

use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::config::DiscoveryConfig;
use super::error::DiscoveryError;
use super::vendor::read_vendor_string;

/// Compiles a file name mask such as `*.flac`.
pub fn build_matcher(mask: &str) -> Result<GlobMatcher, DiscoveryError> {
    Glob::new(mask)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| DiscoveryError::InvalidMask {
            mask: mask.to_string(),
            source,
        })
}

/// Finds files under `folder` whose name matches `mask`.
///
/// Symlinks are followed. Results are sorted by file name within each
/// directory so the batch order is stable between runs.
pub fn find_files(folder: &Path, mask: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !folder.is_dir() {
        return Err(DiscoveryError::FolderNotFound {
            path: folder.to_path_buf(),
        });
    }

    let matcher = build_matcher(mask)?;
    info!(
        "Searching '{}' recursively for files matching mask '{}'...",
        folder.display(),
        mask
    );

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            debug!("File '{}' matches mask", entry.path().display());
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Lists the files to re-encode.
///
/// With `check_vendor`, files already carrying the desired vendor string are
/// left out. A file whose vendor tag cannot be read is kept.
pub async fn discover(config: &DiscoveryConfig) -> Result<Vec<PathBuf>, DiscoveryError> {
    let candidates = find_files(&config.folder, &config.mask)?;

    if !config.check_vendor {
        info!("Found {} file(s).", candidates.len());
        return Ok(candidates);
    }

    info!(
        "Will skip files that match vendor string '{}'.",
        config.vendor_string
    );

    let mut files = Vec::with_capacity(candidates.len());
    for path in candidates {
        match read_vendor_string(&config.metaflac_path, &path).await {
            Ok(vendor) if vendor == config.vendor_string => {
                debug!("Skipped '{}': matches desired vendor string", path.display());
            }
            Ok(vendor) => {
                debug!("Vendor of '{}' is '{}'", path.display(), vendor);
                files.push(path);
            }
            Err(e @ DiscoveryError::MetaflacNotFound { .. }) => return Err(e),
            Err(e) => {
                warn!("{}; re-encoding it anyway", e);
                files.push(path);
            }
        }
    }

    info!("Found {} file(s).", files.len());
    Ok(files)
}
