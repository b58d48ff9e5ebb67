//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LabtrackError, LabtrackResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Default analysis settings.
    #[serde(default)]
    pub analysis: AnalysisDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default parameters for derived-quantity analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    /// Video frame rate used to turn run ids into times (frames per second).
    pub frame_rate: f64,

    /// Decimal exponent of the time unit used for recorded timestamps
    /// (0 = seconds, -3 = milliseconds, -9 = nanoseconds).
    pub time_unit_exponent: i32,

    /// Field delimiter for exported rows.
    pub delimiter: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "labtrack=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            time_unit_exponent: 0,
            delimiter: ",".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location. A missing file yields defaults.
    pub fn load() -> LabtrackResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path. A missing file yields defaults;
    /// an unreadable or malformed one is an error.
    pub fn load_from(config_path: &Path) -> LabtrackResult<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            LabtrackError::config(format!(
                "Failed to read config at {}: {e}",
                config_path.display()
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            LabtrackError::config(format!(
                "Failed to parse config at {}: {e}",
                config_path.display()
            ))
        })
    }

    /// Load config from the standard location, falling back to defaults.
    ///
    /// The fallback reason is handed back so it can be reported once
    /// logging is up.
    pub fn load_or_default() -> (Self, Option<LabtrackError>) {
        match Self::load() {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> LabtrackResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("labtrack").join("config.json")
}
