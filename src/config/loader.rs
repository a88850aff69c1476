use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;
use crate::store::StorePolicy;

const APP_DIR: &str = "notistore";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/notistore/config.toml` on Linux, or the equivalent
    /// via `dirs::config_dir()`. Falls back to the current directory.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join(APP_DIR).join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Both timer intervals must be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.auto_check_interval_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "store.auto_check_interval_secs must be greater than zero".to_string(),
            });
        }

        if self.store.auto_generate_interval_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "store.auto_generate_interval_secs must be greater than zero"
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn store_policy(&self) -> StorePolicy {
        self.store.to_policy()
    }

    /// Where the snapshot lives, or `None` with persistence disabled.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        if !self.persistence.enabled {
            return None;
        }
        let path = self.persistence.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("notifications.json")
        });
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_store_policy_defaults() {
        assert_eq!(Config::default().store_policy(), StorePolicy::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[store]
dedup_window_ms = 500
auto_start_timers = false

[persistence]
path = "/tmp/custom.json"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        let policy = config.store_policy();
        assert_eq!(policy.dedup_window, Duration::from_millis(500));
        assert_eq!(policy.auto_check_interval, Duration::from_secs(10));
        assert!(!policy.auto_start_timers);
        assert_eq!(config.snapshot_path(), Some(PathBuf::from("/tmp/custom.json")));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[store]\nauto_check_interval_secs = 0\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[store\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_disabled_persistence_has_no_path() {
        let mut config = Config::default();
        config.persistence.enabled = false;
        assert_eq!(config.snapshot_path(), None);
    }
}
