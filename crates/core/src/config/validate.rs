use super::{types::Config, ConfigError};
use crate::discovery::build_matcher;

/// Validate configuration
/// Currently validates:
/// - At least one parallel job
/// - Mask is a valid glob
/// - Poll interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pool.jobs == 0 {
        return Err(ConfigError::InvalidParallelism(config.pool.jobs.to_string()));
    }

    build_matcher(&config.discovery.mask)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.pool.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "pool.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_jobs_fails() {
        let mut config = Config::default();
        config.pool.jobs = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::InvalidParallelism(_))));
    }

    #[test]
    fn test_validate_bad_mask_fails() {
        let mut config = Config::default();
        config.discovery.mask = "{*.flac".to_string();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = Config::default();
        config.pool.poll_interval_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }
}
