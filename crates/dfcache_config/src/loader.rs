//! Configuration file loading and validation.

use std::path::Path;

use dfcache_common::TtlDuration;

use crate::error::ConfigError;
use crate::types::CacheConfig;

/// Name of the configuration file looked up by [`load_config`].
pub const CONFIG_FILE: &str = "dfcache.toml";

/// Loads and validates `<project_dir>/dfcache.toml`.
pub fn load_config(project_dir: &Path) -> Result<CacheConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Like [`load_config`], but a missing file yields the default configuration.
pub fn load_config_or_default(project_dir: &Path) -> Result<CacheConfig, ConfigError> {
    match load_config(project_dir) {
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(CacheConfig::default())
        }
        other => other,
    }
}

/// Parses and validates a `dfcache.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<CacheConfig, ConfigError> {
    let config: CacheConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configured values are usable.
fn validate_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.dir must not be empty".to_string(),
        ));
    }
    if let Some(ttl) = &config.cache.invalid_after {
        ttl.parse::<TtlDuration>()
            .map_err(|e| ConfigError::ValidationError(format!("cache.invalid_after: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
dir = "/var/cache/reports"
enabled = false
invalid_after = "12h"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("/var/cache/reports"));
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.invalid_after.as_deref(), Some("12h"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.cache.dir, PathBuf::from(".dfcache"));
        assert!(config.cache.enabled);
        assert!(config.cache.invalid_after.is_none());
    }

    #[test]
    fn invalid_toml() {
        let result = load_config_from_str("[cache\ndir = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn wrong_field_type() {
        let result = load_config_from_str("[cache]\nenabled = \"yes\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn empty_dir_rejected() {
        let result = load_config_from_str("[cache]\ndir = \"\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn bad_duration_rejected() {
        let err = load_config_from_str("[cache]\ninvalid_after = \"soon\"\n").unwrap_err();
        match err {
            ConfigError::ValidationError(msg) => {
                assert!(msg.starts_with("cache.invalid_after:"));
                assert!(msg.contains("soon"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[cache]\ndir = \"artifacts\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("artifacts"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path()),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path()).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from(".dfcache"));
    }
}
