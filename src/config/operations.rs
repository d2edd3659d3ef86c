//! Config loading, validation, and utility operations.

use super::model::MutexConfig;
use super::types::{ENV_OLDEST_TOUCH_MS, ENV_STORE_DIR};
use crate::error::{MutexError, Result};
use crate::lease::Timing;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl MutexConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(MutexConfig)` - Successfully loaded and validated config
    /// * `Err(MutexError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            MutexError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: MutexConfig = serde_yaml::from_str(yaml)
            .map_err(|e| MutexError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| MutexError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - every interval and threshold must be positive
    /// - `acquire_interval_ms <= touch_interval_ms < oldest_touch_ms`
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("oldest_touch_ms", self.oldest_touch_ms),
            ("acquire_interval_ms", self.acquire_interval_ms),
            ("touch_interval_ms", self.touch_interval_ms),
            ("native_poll_interval_ms", self.native_poll_interval_ms),
        ] {
            if value == 0 {
                return Err(MutexError::Config(format!(
                    "config validation failed: {} must be greater than 0",
                    field
                )));
            }
        }

        if self.acquire_interval_ms > self.touch_interval_ms {
            return Err(MutexError::Config(format!(
                "config validation failed: acquire_interval_ms ({}) must not exceed touch_interval_ms ({})",
                self.acquire_interval_ms, self.touch_interval_ms
            )));
        }

        if self.touch_interval_ms >= self.oldest_touch_ms {
            return Err(MutexError::Config(format!(
                "config validation failed: touch_interval_ms ({}) must be less than oldest_touch_ms ({})",
                self.touch_interval_ms, self.oldest_touch_ms
            )));
        }

        Ok(())
    }

    /// Apply `KVMUTEX_STORE_DIR` and `KVMUTEX_OLDEST_TOUCH_MS`, then re-validate.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var(ENV_STORE_DIR)
            && !dir.trim().is_empty()
        {
            self.store_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = std::env::var(ENV_OLDEST_TOUCH_MS) {
            self.oldest_touch_ms = raw.trim().parse().map_err(|_| {
                MutexError::Config(format!(
                    "{} must be a number of milliseconds (found '{}')",
                    ENV_OLDEST_TOUCH_MS, raw
                ))
            })?;
        }

        self.validate()
    }

    /// The protocol periods this config describes.
    pub fn timing(&self) -> Timing {
        Timing {
            oldest_touch: Duration::from_millis(self.oldest_touch_ms),
            acquire_interval: Duration::from_millis(self.acquire_interval_ms),
            touch_interval: Duration::from_millis(self.touch_interval_ms),
            native_poll_interval: Duration::from_millis(self.native_poll_interval_ms),
        }
    }

    /// Directory holding persistent lease records.
    pub fn records_dir(&self) -> PathBuf {
        self.store_dir.join("records")
    }

    /// Directory holding native lock files.
    pub fn native_dir(&self) -> PathBuf {
        self.store_dir.join("native")
    }
}
