//! Pool module: bounded set of running encoder jobs.
//!
//! The [`JobPool`] owns every in-flight [`Job`](crate::encoder::Job), reaps
//! them without blocking, and routes failures through a [`RecoveryPolicy`]
//! (retry, skip or abort). It is driven from a single task and needs no
//! locking; concurrency comes from the encoder processes themselves.
//!
//! # Example
//!
//! ```ignore
//! use reflac_core::encoder::EncoderConfig;
//! use reflac_core::pool::{Decision, FixedPolicy, JobPool};
//!
//! let mut pool = JobPool::new(EncoderConfig::default(), Box::new(FixedPolicy(Decision::Skip)));
//! let id = pool.start("album/01.flac");
//! while !pool.finish(id, false).await? {
//!     tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//! }
//! pool.drain().await;
//! ```

mod config;
mod error;
#[allow(clippy::module_inception)]
mod pool;
mod recovery;
mod types;

pub use config::{default_jobs, FailureAction, PoolConfig};
pub use error::PoolError;
pub use pool::JobPool;
pub use recovery::{policy_for, Decision, FixedPolicy, PromptPolicy, RecoveryPolicy};
pub use types::PoolStats;
