//! Bootstrap configuration loading and data folder resolution
//!
//! Configuration is read once at startup from an optional TOML file. A
//! missing file is not an error: built-in defaults are used and a warning is
//! logged. Values that would break the scheduler are rejected.

use crate::protocol::{SchedulerConfig, UNBOUNDED};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "CLICKSYNC_DATA_FOLDER";

/// Default calibration file name inside the data folder
pub const DEFAULT_CALIBRATION_FILE: &str = "web-audio-calibration.json";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Folder holding persistent data (optional)
    ///
    /// If not specified: command line → environment → OS default
    pub data_folder: Option<PathBuf>,

    /// Calibration file name, relative to the data folder
    pub calibration_file: String,

    /// Initial scheduler parameters
    pub scheduler: SchedulerSettings,

    /// Calibration lookup settings
    pub calibration: CalibrationSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: 8888,
            data_folder: None,
            calibration_file: DEFAULT_CALIBRATION_FILE.to_string(),
            scheduler: SchedulerSettings::default(),
            calibration: CalibrationSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Scheduler startup parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Start clicking immediately
    pub active: bool,
    /// Emission window ahead of each click, in seconds
    pub lookahead_secs: f64,
    /// Spacing between clicks, in seconds
    pub period_secs: f64,
    /// Clicks to emit before stopping (-1 for unbounded)
    pub remaining: i64,
    /// Poll interval of the scheduler loop, in milliseconds
    pub tick_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            active: true,
            lookahead_secs: 1.0,
            period_secs: 1.0,
            remaining: UNBOUNDED,
            tick_ms: 25,
        }
    }
}

impl SchedulerSettings {
    /// Initial scheduler configuration
    pub fn initial_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            active: self.active,
            lookahead: self.lookahead_secs,
            period: self.period_secs,
            remaining: self.remaining,
        }
    }

    /// Poll interval as a Duration
    pub fn tick_duration(&self) -> std::time::Duration {
        crate::time::millis_to_duration(self.tick_ms)
    }
}

/// Calibration lookup settings
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Largest edit distance accepted for a fuzzy identifier match
    ///
    /// `None` accepts any match, however distant.
    pub max_match_distance: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter directive (e.g. "info", "clicksync_server=debug")
    ///
    /// `None` keeps the built-in default; RUST_LOG always wins.
    pub level: Option<String>,
}

impl TomlConfig {
    /// Load configuration from `path`, falling back to defaults if absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_file() {
                Some(path) => path,
                None => {
                    info!("No configuration file found, using built-in defaults");
                    return Ok(Self::default());
                }
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let config = Self::parse(&content)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Configuration file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(Error::Config(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        self.scheduler
            .initial_config()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        if self.scheduler.tick_ms == 0 {
            return Err(Error::Config("scheduler.tick_ms must be positive".to_string()));
        }
        if self.calibration_file.trim().is_empty() {
            return Err(Error::Config("calibration_file must not be empty".to_string()));
        }
        Ok(())
    }

    /// Calibration file path inside `data_folder`
    pub fn calibration_path(&self, data_folder: &Path) -> PathBuf {
        data_folder.join(&self.calibration_file)
    }
}

/// Data folder resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.data_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Create the data folder if needed
///
/// Returns `Ok(true)` if it was created, `Ok(false)` if it already existed.
pub fn ensure_data_folder(path: &Path) -> Result<bool> {
    if path.is_dir() {
        info!("Using existing data directory: {}", path.display());
        return Ok(false);
    }
    std::fs::create_dir_all(path)?;
    info!("Created data directory: {}", path.display());
    Ok(true)
}

/// Default configuration file for the platform, if one exists
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("clicksync").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/clicksync/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/clicksync (or /var/lib/clicksync for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("clicksync"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/clicksync"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/clicksync
        dirs::data_dir()
            .map(|d| d.join("clicksync"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/clicksync"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\clicksync
        dirs::data_local_dir()
            .map(|d| d.join("clicksync"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\clicksync"))
    } else {
        PathBuf::from("./clicksync_data")
    }
}
