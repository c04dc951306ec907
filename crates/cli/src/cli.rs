use clap::Parser;
use std::path::PathBuf;

use reflac_core::{Config, ConfigError, FailureAction};

#[derive(Parser, Debug)]
#[command(name = "reflac")]
#[command(author, version, about = "Re-encode FLAC files in place with parallel flac processes")]
pub struct Cli {
    /// Folder to search recursively [default: .]
    #[arg(short, long)]
    pub folder: Option<PathBuf>,

    /// Glob matched against file names [default: *.flac]
    #[arg(short, long)]
    pub mask: Option<String>,

    /// Skip files whose vendor tag already matches --vendor-string
    #[arg(short = 'v', long)]
    pub vendor: bool,

    /// Vendor string considered up to date
    #[arg(long, value_name = "STRING")]
    pub vendor_string: Option<String>,

    /// Do not verify the encoded stream
    #[arg(long)]
    pub no_verify: bool,

    /// Path to the flac binary
    #[arg(long, value_name = "PATH")]
    pub flac: Option<PathBuf>,

    /// Path to the metaflac binary
    #[arg(long, value_name = "PATH")]
    pub metaflac: Option<PathBuf>,

    /// Number of parallel encoders [default: cores - 1]
    #[arg(short, long, value_name = "N", allow_hyphen_values = true)]
    pub jobs: Option<String>,

    /// Kill an encoder that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// What to do when a file fails: prompt, skip or fail
    #[arg(long, value_name = "ACTION")]
    pub on_failure: Option<FailureAction>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Print the batch summary as JSON on stdout when done
    #[arg(long)]
    pub json_summary: bool,
}

impl Cli {
    /// Overrides `config` with the flags that were given.
    pub fn apply(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(folder) = &self.folder {
            config.discovery.folder = folder.clone();
        }
        if let Some(mask) = &self.mask {
            config.discovery.mask = mask.clone();
        }
        if self.vendor {
            config.discovery.check_vendor = true;
        }
        if let Some(vendor_string) = &self.vendor_string {
            config.discovery.vendor_string = vendor_string.clone();
        }
        if let Some(metaflac) = &self.metaflac {
            config.discovery.metaflac_path = metaflac.clone();
        }
        if self.no_verify {
            config.encoder.verify = false;
        }
        if let Some(flac) = &self.flac {
            config.encoder.flac_path = flac.clone();
        }
        if let Some(timeout) = self.timeout {
            config.encoder.timeout_secs = Some(timeout);
        }
        if let Some(jobs) = &self.jobs {
            config.pool.jobs = parse_jobs(jobs)?;
        }
        if let Some(on_failure) = self.on_failure {
            config.pool.on_failure = on_failure;
        }
        Ok(())
    }
}

/// Parses the parallelism flag. Anything but a positive integer is rejected.
pub fn parse_jobs(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(jobs) if jobs > 0 => {
            usize::try_from(jobs).map_err(|_| ConfigError::InvalidParallelism(value.to_string()))
        }
        _ => Err(ConfigError::InvalidParallelism(value.to_string())),
    }
}
