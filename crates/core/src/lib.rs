pub mod batch;
pub mod config;
pub mod discovery;
pub mod encoder;
pub mod pool;
pub mod testing;

pub use batch::{
    exit_code, BatchDriver, BatchOutcome, BatchProgress, BatchSummary, ProgressCallback,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ENV_PREFIX,
};
pub use discovery::{discover, find_files, DiscoveryConfig, DiscoveryError};
pub use encoder::{
    EncoderConfig, ExitInfo, Job, JobError, JobFailure, JobId, JobResult,
};
pub use pool::{
    policy_for, Decision, FailureAction, FixedPolicy, JobPool, PoolConfig, PoolError, PoolStats,
    PromptPolicy, RecoveryPolicy,
};
