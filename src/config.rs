/*!
 * Configuration types for midsync
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MidsyncError, Result};

/// File name of the per-user configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration shared by `request` and `respond`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Read buffer size in bytes for CRC-32 computation
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Glob patterns matched against path tokens; matching files and
    /// directories are neither recorded nor pushed
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Copy permission bits onto staged files as well as timestamps
    #[serde(default = "default_true")]
    pub preserve_permissions: bool,

    /// Policy flags always enabled for new requests (OR-ed with CLI flags)
    #[serde(default)]
    pub request_defaults: RequestDefaults,

    /// Report what respond would copy without touching the midpoint
    #[serde(default)]
    pub dry_run: bool,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            exclude_patterns: Vec::new(),
            preserve_permissions: true,
            request_defaults: RequestDefaults::default(),
            dry_run: false,
            log_level: LogLevel::Warn,
            log_file: None,
            verbose: false,
        }
    }
}

/// Policy flags a site wants on every request it builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDefaults {
    #[serde(default)]
    pub mtime: bool,
    #[serde(default)]
    pub size: bool,
    #[serde(default)]
    pub crc32: bool,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    #[default]
    Warn,

    /// Info, warnings, and errors
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    1024 * 1024 // 1 MB
}

impl SyncConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MidsyncError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: SyncConfig = toml::from_str(&contents).map_err(|e| {
            MidsyncError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, else from the per-user config file if one
    /// exists, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Reject values that would make the core misbehave
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(MidsyncError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        for pattern in &self.exclude_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                MidsyncError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }
}

/// Per-user configuration file location (`<config_dir>/midsync/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("midsync").join(CONFIG_FILE_NAME))
}
