//! Engine settings file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, write_with_parents};

/// Offline and device rendering settings.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000.0
/// block_size = 512
/// log_filter = "info"
/// ```
///
/// Every field is optional; a missing field takes its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Frames requested per pull.
    pub block_size: usize,
    /// `tracing_subscriber::EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 512,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save settings to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_with_parents(path.as_ref(), &self.to_toml()?)
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replaces out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.sample_rate.is_finite() && self.sample_rate >= 1.0) {
            tracing::warn!(sample_rate = self.sample_rate, "invalid sample rate, using default");
            self.sample_rate = defaults.sample_rate;
        }
        if self.block_size == 0 {
            tracing::warn!("block size of zero, using default");
            self.block_size = defaults.block_size;
        }
        self
    }
}
