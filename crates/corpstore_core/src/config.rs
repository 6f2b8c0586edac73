//! Persistence unit configuration.
//!
//! # Responsibility
//! - Describe where the unit stores data and how it logs.
//! - Load and validate configuration from JSON files.
//!
//! # Invariants
//! - Every field has a default, so `{}` is a valid configuration.
//! - `validate()` runs before a configuration is used to open a unit.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default persistence unit name.
pub const DEFAULT_UNIT_NAME: &str = "corpPU";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Storage location of a persistence unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatabaseLocation {
    #[default]
    Memory,
    File {
        path: PathBuf,
    },
}

/// Logging settings. `dir = None` logs to stderr.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistenceConfig {
    pub unit_name: String,
    pub database: DatabaseLocation,
    pub busy_timeout_ms: u64,
    pub log: LogConfig,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            unit_name: DEFAULT_UNIT_NAME.to_string(),
            database: DatabaseLocation::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log: LogConfig::default(),
        }
    }
}

impl PersistenceConfig {
    /// Parses a configuration from JSON text and validates it.
    pub fn from_json(text: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.unit_name.trim().is_empty() {
            return Err(ConfigError::Invalid("unit_name cannot be empty".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "busy_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if let DatabaseLocation::File { path } = &self.database {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "database.path cannot be empty".to_string(),
                ));
            }
        }
        normalize_level(&self.log.level).map_err(ConfigError::Invalid)?;
        if let Some(dir) = &self.log.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Reads and validates a JSON configuration file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<PersistenceConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    PersistenceConfig::from_json(&text, path)
}

#[cfg(test)]
mod tests {
    use super::{load_config, ConfigError, DatabaseLocation, PersistenceConfig};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn empty_object_yields_defaults() {
        let config = PersistenceConfig::from_json("{}", Path::new("inline")).unwrap();
        assert_eq!(config, PersistenceConfig::default());
        assert_eq!(config.unit_name, "corpPU");
        assert_eq!(config.database, DatabaseLocation::Memory);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn file_location_and_log_settings_parse() {
        let json = r#"{
            "unit_name": "hrPU",
            "database": { "kind": "file", "path": "/var/lib/corp/hr.db" },
            "busy_timeout_ms": 250,
            "log": { "level": "WARN", "dir": "/var/log/corp" }
        }"#;
        let config = PersistenceConfig::from_json(json, Path::new("inline")).unwrap();

        assert_eq!(config.unit_name, "hrPU");
        assert_eq!(
            config.database,
            DatabaseLocation::File {
                path: PathBuf::from("/var/lib/corp/hr.db")
            }
        );
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.log.dir, Some(PathBuf::from("/var/log/corp")));
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        let unknown = PersistenceConfig::from_json(r#"{"unit": "x"}"#, Path::new("inline"));
        assert!(matches!(unknown, Err(ConfigError::Parse { .. })));

        let relative_dir =
            PersistenceConfig::from_json(r#"{"log": {"dir": "logs"}}"#, Path::new("inline"));
        assert!(matches!(relative_dir, Err(ConfigError::Invalid(_))));

        let bad_level =
            PersistenceConfig::from_json(r#"{"log": {"level": "loud"}}"#, Path::new("inline"));
        assert!(matches!(bad_level, Err(ConfigError::Invalid(_))));

        let blank_unit =
            PersistenceConfig::from_json(r#"{"unit_name": "  "}"#, Path::new("inline"));
        assert!(matches!(blank_unit, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_config_reads_file_and_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpstore.json");
        std::fs::write(&path, r#"{"busy_timeout_ms": 1000}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.busy_timeout_ms, 1000);

        let missing = load_config(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
