// polyglot-config/src/config.rs
// ============================================================================
// Module: Configuration Model
// Description: polyglot.toml sections, loading, and validation.
// Purpose: Turn operator configuration into a dialect and store settings.
// Dependencies: polyglot-core, polyglot-store, serde, toml, thiserror
// ============================================================================

//! ## Overview
//! The configuration has three sections: `[database]` selects the engine and
//! how to reach it, `[migrations]` controls startup migration, and `[audit]`
//! picks the authorization audit sink. The selector is resolved with
//! [`Dialect::resolve`] and never falls back to another engine.
//! `POLYGLOT_DB_TYPE` overrides `database.type` when set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use polyglot_core::ConfigurationError;
use polyglot_core::Dialect;
use polyglot_store::MysqlStoreConfig;
use polyglot_store::PostgresStoreConfig;
use polyglot_store::SqliteStoreConfig;
use polyglot_store::SqliteStoreMode;
use polyglot_store::SqliteSyncMode;
use polyglot_store::StoreConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "POLYGLOT_CONFIG";
/// Environment variable overriding `database.type`.
pub const DB_TYPE_ENV_VAR: &str = "POLYGLOT_DB_TYPE";
/// Config file read when no path is given.
const DEFAULT_CONFIG_NAME: &str = "polyglot.toml";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum pool size accepted.
const MAX_POOL_SIZE: u32 = 256;
/// Maximum busy or connect timeout accepted (ms).
const MAX_TIMEOUT_MS: u64 = 600_000;
/// Default Postgres port.
const DEFAULT_POSTGRES_PORT: u16 = 5432;
/// Default MySQL port.
const DEFAULT_MYSQL_PORT: u16 = 3306;

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolyglotConfig {
    /// Database selection and connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Startup migration settings.
    #[serde(default)]
    pub migrations: MigrationsConfig,
    /// Authorization audit settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Dialect selector: `postgres`, `mysql`, `better-sqlite3` or `sqlite`.
    #[serde(rename = "type", default = "default_db_type")]
    pub db_type: String,
    /// `SQLite` database file.
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
    /// `SQLite` busy timeout (ms).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port; defaults per engine.
    #[serde(default)]
    pub port: Option<u16>,
    /// Login user.
    #[serde(default = "default_username")]
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Database (schema) name.
    #[serde(default = "default_database")]
    pub database: String,
    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connect timeout (ms).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Postgres statement timeout (ms).
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: default_db_type(),
            path: default_sqlite_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            host: default_host(),
            port: None,
            username: default_username(),
            password: String::new(),
            database: default_database(),
            max_connections: default_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

/// `[migrations]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Apply pending migrations at startup.
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            auto_migrate: true,
        }
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Discard audit events.
    None,
}

/// `[audit]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink receiving authorization decisions.
    #[serde(default)]
    pub sink: AuditSinkKind,
}

/// Default selector.
fn default_db_type() -> String {
    "mysql".to_string()
}

/// Default `SQLite` file.
fn default_sqlite_path() -> PathBuf {
    PathBuf::from("data/polyglot.sqlite3")
}

/// Default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Default host.
fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Default user.
fn default_username() -> String {
    "root".to_string()
}

/// Default database name.
fn default_database() -> String {
    "polyglot".to_string()
}

/// Default pool size.
const fn default_max_connections() -> u32 {
    16
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Default statement timeout.
const fn default_statement_timeout_ms() -> u64 {
    30_000
}

/// Serde helper for `true` defaults.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Database selector could not be resolved.
    #[error(transparent)]
    Dialect(#[from] ConfigurationError),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl PolyglotConfig {
    /// Loads configuration from `path`, `POLYGLOT_CONFIG`, or `polyglot.toml`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error. Environment overrides are applied before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let mut config = if !explicit && !resolved.exists() {
            Self::default()
        } else {
            let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
            if bytes.len() > MAX_CONFIG_FILE_SIZE {
                return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
            }
            let content = std::str::from_utf8(&bytes)
                .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
            Self::parse(content)?
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML without applying overrides or validating.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_type) = lookup(DB_TYPE_ENV_VAR).filter(|value| !value.trim().is_empty()) {
            self.database.db_type = db_type;
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown selector or out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let database = &self.database;
        let dialect = self.dialect()?;
        if database.busy_timeout_ms > MAX_TIMEOUT_MS || database.connect_timeout_ms > MAX_TIMEOUT_MS
        {
            return Err(ConfigError::Invalid("database timeout exceeds limit".to_string()));
        }
        if dialect.is_embedded() {
            return validate_path_string("database.path", &database.path.to_string_lossy());
        }
        if database.host.trim().is_empty() {
            return Err(ConfigError::Invalid("database.host must be non-empty".to_string()));
        }
        if database.database.trim().is_empty() {
            return Err(ConfigError::Invalid("database.database must be non-empty".to_string()));
        }
        if database.username.trim().is_empty() {
            return Err(ConfigError::Invalid("database.username must be non-empty".to_string()));
        }
        if database.max_connections == 0 || database.max_connections > MAX_POOL_SIZE {
            return Err(ConfigError::Invalid(format!(
                "database.max_connections must be between 1 and {MAX_POOL_SIZE}"
            )));
        }
        if database.port == Some(0) {
            return Err(ConfigError::Invalid("database.port must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Resolves the configured dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dialect`] for unsupported selectors.
    pub fn dialect(&self) -> Result<Dialect, ConfigError> {
        Ok(Dialect::resolve(&self.database.db_type)?)
    }

    /// Builds the store configuration for the configured dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dialect`] for unsupported selectors.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let database = &self.database;
        Ok(match self.dialect()? {
            Dialect::Sqlite => StoreConfig::Sqlite(SqliteStoreConfig {
                path: database.path.clone(),
                busy_timeout_ms: database.busy_timeout_ms,
                journal_mode: database.journal_mode,
                sync_mode: database.sync_mode,
            }),
            Dialect::Postgres => StoreConfig::Postgres(PostgresStoreConfig {
                connection: format!(
                    "host={} port={} user={} password={} dbname={}",
                    conninfo_value(&database.host),
                    database.port.unwrap_or(DEFAULT_POSTGRES_PORT),
                    conninfo_value(&database.username),
                    conninfo_value(&database.password),
                    conninfo_value(&database.database)
                ),
                max_connections: database.max_connections,
                connect_timeout_ms: database.connect_timeout_ms,
                statement_timeout_ms: database.statement_timeout_ms,
            }),
            Dialect::Mysql => StoreConfig::Mysql(MysqlStoreConfig {
                connection: format!(
                    "mysql://{}:{}@{}:{}/{}",
                    percent_encode(&database.username),
                    percent_encode(&database.password),
                    database.host,
                    database.port.unwrap_or(DEFAULT_MYSQL_PORT),
                    percent_encode(&database.database)
                ),
                max_connections: database.max_connections,
                connect_timeout_ms: database.connect_timeout_ms,
            }),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and reports whether it was chosen explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Quotes a libpq key/value connection parameter.
fn conninfo_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Percent-encodes a URL userinfo or path segment.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::conninfo_value;
    use super::percent_encode;

    #[test]
    fn connection_values_are_escaped() {
        assert_eq!(conninfo_value("pa'ss"), "'pa\\'ss'");
        assert_eq!(percent_encode("p@ss w/rd"), "p%40ss%20w%2Frd");
    }
}
