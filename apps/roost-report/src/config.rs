//! Report binary configuration.
//!
//! Resolved in layers, later layers winning:
//!
//! ```text
//! defaults → roost.toml (or --config <path>) → ROOST_* environment → validate
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use roost_core::validation::validate_id;
use roost_core::DEFAULT_TENANT_ID;
use roost_db::DbConfig;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "roost.toml";

/// Report binary configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Tenant every report is scoped to
    pub tenant_id: String,

    /// Pool size
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,

    /// Seconds SQLite waits on a locked database
    pub busy_timeout_secs: u64,

    /// Apply pending migrations before reporting
    pub run_migrations: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            database_path: default_database_path(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            max_connections: 2,
            acquire_timeout_secs: 10,
            busy_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

impl ReportConfig {
    /// Loads configuration from file and process environment.
    ///
    /// An explicit `path` must exist; the default `roost.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    ReportConfig::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            message: e.to_string(),
        })
    }

    /// Applies `ROOST_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup("ROOST_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(tenant) = lookup("ROOST_TENANT_ID") {
            self.tenant_id = tenant;
        }
        if let Some(value) = lookup("ROOST_MAX_CONNECTIONS") {
            self.max_connections = parse_var("ROOST_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = lookup("ROOST_ACQUIRE_TIMEOUT_SECS") {
            self.acquire_timeout_secs = parse_var("ROOST_ACQUIRE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("ROOST_BUSY_TIMEOUT_SECS") {
            self.busy_timeout_secs = parse_var("ROOST_BUSY_TIMEOUT_SECS", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections must be at least 1".to_string()));
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("acquire_timeout_secs must be positive".to_string()));
        }
        validate_id("tenant_id", &self.tenant_id)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
            .run_migrations(self.run_migrations)
            .tenant_id(self.tenant_id.clone())
    }
}

/// Platform data directory, e.g. `~/.local/share/roost/roost.db` on Linux.
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "roost", "roost")
        .map(|dirs| dirs.data_dir().join("roost.db"))
        .unwrap_or_else(|| PathBuf::from("roost.db"))
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{key}={value}")))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
