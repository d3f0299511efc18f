//! Logger configuration
//!
//! A `Config` is an immutable snapshot consumed at initialization and by the
//! rotation monitor. It can be built in code or loaded from a file in one of:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::{Level, RotationErrorPolicy};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

fn default_project_key() -> String {
    DEFAULT_PROJECT_KEY.to_string()
}

fn default_max_log_size() -> u64 {
    DEFAULT_MAX_LOG_SIZE
}

fn default_monitor_interval_ms() -> u64 {
    DEFAULT_MONITOR_INTERVAL_MS
}

fn default_true() -> bool {
    true
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log file path
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Key under which the project name is attached
    #[serde(default = "default_project_key")]
    pub project_key: String,
    /// Project name
    #[serde(default)]
    pub project_name: String,
    /// Maximum log file size in bytes (0 disables size-based truncation)
    #[serde(default = "default_max_log_size")]
    pub max_log_size: u64,
    /// Interval between size checks in milliseconds (0 disables the monitor)
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
    #[serde(default = "default_true")]
    pub enable_console_output: bool,
    #[serde(default)]
    pub enable_file_output: bool,
    /// Records below this level are discarded
    #[serde(default)]
    pub level: Level,
    /// Colour level tags on the console
    #[serde(default = "default_true")]
    pub console_color: bool,
    #[serde(default)]
    pub on_rotation_error: RotationErrorPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            project_key: default_project_key(),
            project_name: String::new(),
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            monitor_interval_ms: DEFAULT_MONITOR_INTERVAL_MS,
            enable_console_output: true,
            enable_file_output: false,
            level: Level::default(),
            console_color: true,
            on_rotation_error: RotationErrorPolicy::default(),
        }
    }
}

impl Config {
    /// Config writing to `path` only, with the monitor at its default interval
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            log_path: path.into(),
            enable_console_output: false,
            enable_file_output: true,
            ..Default::default()
        }
    }

    pub fn with_project<K: Into<String>, N: Into<String>>(mut self, key: K, name: N) -> Self {
        self.project_key = key.into();
        self.project_name = name.into();
        self
    }

    pub fn with_max_log_size(mut self, bytes: u64) -> Self {
        self.max_log_size = bytes;
        self
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.set_monitor_interval(interval);
        self
    }

    /// Store `interval` in whole milliseconds, rounding up so that only a
    /// zero duration disables the monitor
    pub fn set_monitor_interval(&mut self, interval: Duration) {
        let ms = interval.as_nanos().div_ceil(1_000_000);
        self.monitor_interval_ms = u64::try_from(ms).unwrap_or(u64::MAX);
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// The monitor runs only for file output with a positive interval
    pub fn monitor_enabled(&self) -> bool {
        self.enable_file_output && self.monitor_interval_ms > 0
    }

    pub fn rotation_enabled(&self) -> bool {
        self.max_log_size > 0
    }

    /// Check the values the sinks depend on
    pub fn validate(&self) -> Result<()> {
        if self.project_key.trim().is_empty() {
            return Err(Error::config("project_key must not be empty"));
        }
        if RESERVED_FIELDS.contains(&self.project_key.as_str()) {
            return Err(Error::config(format!(
                "project_key must not be one of the record fields {:?}",
                RESERVED_FIELDS
            )));
        }

        if self.enable_file_output {
            if self.log_path.as_os_str().is_empty() {
                return Err(Error::config(
                    "log_path must be set when file output is enabled",
                ));
            }
            if self.log_path.file_name().is_none() {
                return Err(Error::config(format!(
                    "log_path has no file name: {}",
                    self.log_path.display()
                )));
            }
        }

        Ok(())
    }

    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => Self::from_toml(content),
            ConfigFormat::Yaml => Self::from_yaml(content),
            ConfigFormat::Json => Self::from_json(content),
        }
    }

    /// Parse TOML config content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Parse YAML config content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Parse JSON config content
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Find and load the first of [`CONFIG_FILES`] present in `dir`
    ///
    /// Returns [`Error::ConfigNotFound`] with `dir` when none exists.
    pub fn find_and_load(dir: &Path) -> Result<(Self, PathBuf)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, path));
            }
        }
        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }
}
