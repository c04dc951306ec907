use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveryConfig;
use crate::encoder::EncoderConfig;
use crate::pool::PoolConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}
