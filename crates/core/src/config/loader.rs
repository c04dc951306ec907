use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides, e.g. `REFLAC_POOL__JOBS=4`.
pub const ENV_PREFIX: &str = "REFLAC_";

/// Load configuration: defaults, then the optional TOML file, then
/// environment variable overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::FailureAction;
    use figment::Jail;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[pool]
jobs = 3
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.pool.jobs, 3);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[pool]
jobs = "many"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Some(Path::new("/nonexistent/reflac.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[discovery]
mask = "*.fla?"

[encoder]
flac_path = "/opt/flac/bin/flac"
"#
        )
        .unwrap();

        let config = load_config(Some(temp_file.path())).unwrap();
        assert_eq!(config.discovery.mask, "*.fla?");
        assert_eq!(config.encoder.flac_path, Path::new("/opt/flac/bin/flac"));
        assert_eq!(config.pool.poll_interval_ms, 100);
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "reflac.toml",
                r#"
[pool]
jobs = 2
on_failure = "fail"
"#,
            )?;
            jail.set_env("REFLAC_POOL__JOBS", "5");
            jail.set_env("REFLAC_ENCODER__VERIFY", "false");

            let config =
                load_config(Some(Path::new("reflac.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.pool.jobs, 5);
            assert_eq!(config.pool.on_failure, FailureAction::Fail);
            assert!(!config.encoder.verify);
            Ok(())
        });
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.discovery.mask, "*.flac");
            assert!(config.encoder.silent);
            Ok(())
        });
    }
}
