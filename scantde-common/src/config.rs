//! Configuration loading and data directory resolution
//!
//! Data directory priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SCANTDE_DATA_DIR` environment variable
//! 3. `data_dir` in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal; it is logged and the
//! compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SCANTDE_DATA_DIR";

/// Environment variable overriding the config file location
pub const CONFIG_FILE_ENV: &str = "SCANTDE_CONFIG";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// TOML configuration file contents
///
/// All fields are optional; anything absent falls back to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base output directory for caches, logs and artifacts
    pub data_dir: Option<PathBuf>,

    /// Directory holding classifier model artifacts
    pub models_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Finite maturity-window thresholds in days (unbounded window implied)
    pub thermal_windows: Option<Vec<f64>>,

    /// Overrides for triage thresholds, interpreted by the pipeline crate
    pub parameters: Option<toml::Table>,
}

impl TomlConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the config from the standard location, or defaults if absent
    pub fn load_or_default() -> Self {
        let Some(path) = config_file_path() else {
            debug!("No config file found, using compiled defaults");
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config file");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            }
        }
    }
}

/// Locate the config file for the platform
///
/// `SCANTDE_CONFIG` wins if set; otherwise the user config dir, then
/// `/etc/scantde/config.toml` on Linux.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        let path = PathBuf::from(path);
        return path.exists().then_some(path);
    }

    let user_config = dirs::config_dir().map(|d| d.join("scantde").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/scantde/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scantde"))
        .unwrap_or_else(|| PathBuf::from("./scantde_data"))
}

/// Resolves the data directory following the documented priority order
#[derive(Debug, Clone, Default)]
pub struct DataDirResolver {
    toml_data_dir: Option<PathBuf>,
}

impl DataDirResolver {
    pub fn new(config: &TomlConfig) -> Self {
        Self {
            toml_data_dir: config.data_dir.clone(),
        }
    }

    pub fn resolve(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(DATA_DIR_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_data_dir {
            return path.clone();
        }

        default_data_dir()
    }
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        debug!(path = %path.display(), "Created directory");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
            data_dir = "/data/scantde"
            models_dir = "/data/models"
            thermal_windows = [14.0, 30.0, 60.0]

            [logging]
            level = "debug"

            [parameters]
            max_sgscore = 0.4
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, Some(PathBuf::from("/data/scantde")));
        assert_eq!(config.models_dir, Some(PathBuf::from("/data/models")));
        assert_eq!(config.thermal_windows, Some(vec![14.0, 30.0, 60.0]));
        assert_eq!(config.logging.level, "debug");
        let params = config.parameters.unwrap();
        assert_eq!(params.get("max_sgscore").and_then(|v| v.as_float()), Some(0.4));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.data_dir.is_none());
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.parameters.is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(TomlConfig::from_toml_str("data_dir = [").is_err());
    }

    #[test]
    fn test_cli_argument_has_highest_priority() {
        let config = TomlConfig {
            data_dir: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolver = DataDirResolver::new(&config);
        let resolved = resolver.resolve(Some(Path::new("/from/cli")));
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_ensure_directory_creates_nested() {
        let temp = tempfile::TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op
        ensure_directory(&nested).unwrap();
    }
}
