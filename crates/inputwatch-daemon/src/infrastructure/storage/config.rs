//! TOML-based configuration for the daemon.
//!
//! Reads `AppConfig` from an explicit path or from the platform-appropriate
//! config file:
//! - Windows:  `%APPDATA%\InputWatch\config.toml`
//! - Linux:    `~/.config/inputwatch/config.toml`
//! - macOS:    `~/Library/Application Support/InputWatch/config.toml`
//!
//! Example:
//!
//! ```toml
//! [monitor]
//! activity_timeout_ms = 3000
//! log_level = "info"
//!
//! [report]
//! key_events = true
//! activity_pulses = false
//! activity_changes = true
//!
//! [[chords]]
//! name = "save"
//! keys = ["Control", "s"]
//! exclusive = true
//! ```
//!
//! # Serde default values
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A chord entry is unusable.
    #[error("chord {name:?} must list at least one key")]
    EmptyChord { name: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub chords: Vec<ChordConfig>,
}

/// Settings for the key and activity services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Quiet period after which the user is considered inactive.
    #[serde(default = "default_activity_timeout_ms")]
    pub activity_timeout_ms: u64,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which notifications the reporter writes to stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// Key down / up / repeat notifications.
    #[serde(default = "default_true")]
    pub key_events: bool,
    /// One line per qualifying activity signal.  Noisy: every mouse move.
    #[serde(default)]
    pub activity_pulses: bool,
    /// ACTIVE / INACTIVE transitions.
    #[serde(default = "default_true")]
    pub activity_changes: bool,
}

/// A named key chord to watch for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChordConfig {
    pub name: String,
    /// Key identifiers, DOM `KeyboardEvent.key` style.
    pub keys: Vec<String>,
    /// Only match when no other key is held.
    #[serde(default)]
    pub exclusive: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_activity_timeout_ms() -> u64 {
    3000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            activity_timeout_ms: default_activity_timeout_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            key_events: default_true(),
            activity_pulses: false,
            activity_changes: default_true(),
        }
    }
}

impl MonitorConfig {
    /// The inactivity window as a `Duration`.
    pub fn activity_timeout(&self) -> Duration {
        Duration::from_millis(self.activity_timeout_ms)
    }
}

impl AppConfig {
    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyChord`] for a chord without keys.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.chords.iter().find(|chord| chord.keys.is_empty()) {
            Some(chord) => Err(ConfigError::EmptyChord {
                name: chord.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, or from the platform default location when
/// `path` is `None`.
///
/// A missing platform file yields `AppConfig::default()`; a missing explicit
/// file is an error.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors, [`ConfigError::Parse`]
/// if the TOML is malformed, and [`ConfigError::EmptyChord`] if validation
/// fails.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)?
        }
        None => {
            let path = config_file_path()?;
            match std::fs::read_to_string(&path) {
                Ok(content) => parse_config(&content)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                Err(e) => return Err(ConfigError::Io { path, source: e }),
            }
        }
    };
    config.validate()?;
    Ok(config)
}

/// Parses TOML text into an `AppConfig`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("InputWatch"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("inputwatch"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("InputWatch")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
