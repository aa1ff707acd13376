//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{PlockError, Result};
use std::path::Path;
use std::time::Duration;

/// Config file read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/plock/config.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            PlockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load `path` if given, else the default config file if present, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| PlockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| PlockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `work_dir` must be non-empty
    /// - `retry_interval_ms` must be positive
    /// - `default_timeout_secs`, when set, must exceed the retry interval
    /// - `killable_executables` entries must be bare, non-empty names
    pub fn validate(&self) -> Result<()> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(PlockError::Config(
                "config validation failed: work_dir must not be empty".to_string(),
            ));
        }

        if self.retry_interval_ms == 0 {
            return Err(PlockError::Config(
                "config validation failed: retry_interval_ms must be greater than 0".to_string(),
            ));
        }

        if let Some(timeout) = self.default_timeout()
            && timeout <= self.retry_interval()
        {
            return Err(PlockError::Config(format!(
                "config validation failed: default_timeout_secs ({:?}) must be greater than retry_interval_ms ({:?})",
                timeout,
                self.retry_interval()
            )));
        }

        for exe in &self.killable_executables {
            if exe.is_empty() {
                return Err(PlockError::Config(
                    "config validation failed: killable_executables entries must be non-empty"
                        .to_string(),
                ));
            }
            if exe.contains('/') {
                return Err(PlockError::Config(format!(
                    "config validation failed: killable_executables entries are executable names, not paths (found '{}'). Use '{}' instead.",
                    exe,
                    exe.rsplit('/').next().unwrap_or_default()
                )));
            }
        }

        Ok(())
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_secs.map(Duration::from_secs)
    }
}
