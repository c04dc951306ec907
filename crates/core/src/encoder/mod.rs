//! Encoder module: one `flac` process per input file.
//!
//! flac re-encodes in place. While it runs it writes to
//! `<input>.tmp,fl-ac+en'c` and renames that over the input on success. A
//! [`Job`] owns the process and removes the temporary file once the process
//! has ended, however it ended.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reflac_core::encoder::{EncoderConfig, Job, JobId};
//!
//! let config = Arc::new(EncoderConfig::default());
//! let mut job = Job::new(JobId(0), "album/01.flac".into(), 1, config);
//! job.start()?;
//! let result = job.wait().await;
//! assert!(result.is_success());
//! ```

mod config;
mod error;
pub mod flac;
mod job;
mod types;

pub use config::EncoderConfig;
pub use error::JobError;
pub use job::Job;
pub use types::{ExitInfo, JobFailure, JobId, JobResult};
