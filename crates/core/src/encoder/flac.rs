//! The command-line contract with the `flac` reference encoder.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::config::EncoderConfig;
use super::error::JobError;

/// Suffix flac appends to the input name while it writes the re-encoded
/// stream. The file is renamed over the input on success.
pub const TEMP_SUFFIX: &str = ".tmp,fl-ac+en'c";

/// Message flac prints when a file is already as small as it gets.
pub const BENIGN_NOTICE: &str = "could not compress further";

/// Builds the argument list for re-encoding `input` in place.
pub fn build_args(config: &EncoderConfig, input: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        input.as_os_str().to_os_string(),
        "--force".into(),
        "--best".into(),
    ];

    if config.verify {
        args.push("-V".into());
    }

    if config.silent {
        args.push("-s".into());
    }

    args
}

/// Path of the temporary sibling flac writes for `input`.
pub fn temp_path(input: &Path) -> PathBuf {
    let mut name: OsString = input.as_os_str().to_os_string();
    name.push(OsStr::new(TEMP_SUFFIX));
    PathBuf::from(name)
}

/// Whether the encoder output only carries the "could not compress" notice.
pub fn is_benign(output: &str) -> bool {
    output.to_ascii_lowercase().contains(BENIGN_NOTICE)
}

/// Runs `flac --version` and returns the reported version line.
pub async fn probe_version(config: &EncoderConfig) -> Result<String, JobError> {
    let output = Command::new(&config.flac_path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| JobError::spawn(&config.flac_path, &config.flac_path, e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().unwrap_or_default().trim().to_string();

    if !output.status.success() || line.is_empty() {
        return Err(JobError::UnexpectedVersion {
            output: format!("{}{}", stdout, String::from_utf8_lossy(&output.stderr)),
        });
    }

    Ok(line)
}
