//! Texture cache configuration.
//!
//! The VRAM budget can be set programmatically, read from a TOML file or
//! overridden through an environment variable. [`TextureCacheConfig::load`]
//! applies them in that order: defaults, then the user's config file, then
//! the environment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the budget, in megabytes.
pub const CAPACITY_ENV_VAR: &str = "RADVIEW_TEXTURE_CACHE_MB";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Configuration for the GPU texture cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCacheConfig {
    /// VRAM budget in bytes
    pub capacity_bytes: u64,
}

impl Default for TextureCacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 256 * BYTES_PER_MB, // 256 MB
        }
    }
}

/// On-disk layout of the configuration file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    /// Signed so that a negative value is reported as such, not as a
    /// TOML type error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity_mb: Option<i64>,
}

impl TextureCacheConfig {
    pub fn new(capacity_bytes: u64) -> Self {
        Self { capacity_bytes }
    }

    /// Sets the budget in megabytes.
    pub fn with_capacity_mb(mut self, mb: u64) -> Self {
        self.capacity_bytes = mb.saturating_mul(BYTES_PER_MB);
        self
    }

    /// Returns the budget in whole megabytes.
    pub fn capacity_mb(&self) -> u64 {
        self.capacity_bytes / BYTES_PER_MB
    }

    /// Returns the per-user configuration file location.
    ///
    /// - macOS: ~/Library/Application Support/radview/texture-cache.toml
    /// - Linux: ~/.config/radview/texture-cache.toml
    /// - Windows: %APPDATA%\radview\texture-cache.toml
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDirectory)?;
        Ok(dir.join("radview").join("texture-cache.toml"))
    }

    /// Loads defaults, the user's config file (if any), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_config_path()?)
    }

    /// Like [`load`](Self::load) but reads the config file at `path`.
    ///
    /// A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env()
    }

    /// Loads configuration from environment variables.
    ///
    /// `RADVIEW_TEXTURE_CACHE_MB` sets the budget in megabytes (default: 256).
    ///
    /// # Errors
    /// Returns an error if the variable is set to anything but a non-negative
    /// integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var(CAPACITY_ENV_VAR) {
            let mb = value
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(CAPACITY_ENV_VAR, &value))?;
            self.capacity_bytes = mb_to_bytes(CAPACITY_ENV_VAR, mb)?;
        }
        Ok(self)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format:
    /// ```toml
    /// capacity_mb = 256
    /// ```
    /// Missing keys keep their defaults and unknown keys are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(toml_str)?;
        let mut config = Self::default();

        if let Some(mb) = file.capacity_mb {
            let mb = u64::try_from(mb).map_err(|_| invalid("capacity_mb", &mb.to_string()))?;
            config.capacity_bytes = mb_to_bytes("capacity_mb", mb)?;
        }

        Ok(config)
    }

    /// Saves configuration to a TOML file, creating parent directories.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    fn to_toml(&self) -> Result<String, ConfigError> {
        let capacity_mb = i64::try_from(self.capacity_mb())
            .map_err(|_| invalid("capacity_mb", &self.capacity_mb().to_string()))?;
        let file = ConfigFile {
            capacity_mb: Some(capacity_mb),
        };
        Ok(toml::to_string(&file)?)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn mb_to_bytes(key: &str, mb: u64) -> Result<u64, ConfigError> {
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| invalid(key, &mb.to_string()))
}
