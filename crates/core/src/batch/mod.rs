//! Batch module: drives a list of files through the job pool.
//!
//! The [`BatchDriver`] submits files in order, keeps at most `jobs` encoders
//! running, reports one [`BatchProgress`] line per file and shuts down in
//! order on completion, abort or interrupt.
//!
//! # Example
//!
//! ```ignore
//! use reflac_core::batch::BatchDriver;
//! use reflac_core::pool::{policy_for, JobPool};
//! use tokio_util::sync::CancellationToken;
//!
//! let pool = JobPool::new(config.encoder.clone(), policy_for(config.pool.on_failure));
//! let mut driver = BatchDriver::new(pool, &config.pool).with_root(&config.discovery.folder);
//! let outcome = driver.run(&files, &CancellationToken::new()).await?;
//! std::process::exit(outcome.exit_code());
//! ```

mod driver;
mod types;

pub use driver::BatchDriver;
pub use types::{exit_code, BatchOutcome, BatchProgress, BatchSummary, ProgressCallback};
