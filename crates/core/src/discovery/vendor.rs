//! Vendor tag lookup through `metaflac`.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::error::DiscoveryError;

/// Reads the vendor string of `path` with `metaflac --show-vendor-tag`.
pub async fn read_vendor_string(metaflac: &Path, path: &Path) -> Result<String, DiscoveryError> {
    let output = Command::new(metaflac)
        .arg("--show-vendor-tag")
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DiscoveryError::MetaflacNotFound {
                    path: metaflac.to_path_buf(),
                }
            } else {
                DiscoveryError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(DiscoveryError::VendorProbeFailed {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
