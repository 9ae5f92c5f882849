// polyglot-core/src/dialect/mod.rs
// ============================================================================
// Module: Dialect Registry
// Description: Supported storage dialects and the process-wide active dialect.
// Purpose: Resolve the dialect once from configuration and hand out strategies.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Three dialects are supported: Postgres (rich ALTER TABLE, named enums),
//! MySQL (rich ALTER TABLE, inline enums, charset/collation rules) and
//! `SQLite` (no enums, no DROP/ALTER COLUMN, foreign keys emulated with
//! triggers). The selector string is resolved exactly once; unknown selectors
//! fail closed with [`ConfigurationError::UnknownDialect`] and never fall back
//! to another dialect. Components receive a [`DialectStrategy`] by injection
//! rather than consulting the registry.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod strategy;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::OnceLock;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub use self::mysql::MysqlDialect;
pub use self::postgres::PostgresDialect;
pub use self::sqlite::SqliteDialect;
pub use self::strategy::DialectStrategy;
pub use self::strategy::MigrationLockSql;

// ============================================================================
// SECTION: Dialect
// ============================================================================

/// Storage dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Postgres-like engine.
    Postgres,
    /// MySQL-like engine.
    Mysql,
    /// Embedded `SQLite`-like engine.
    Sqlite,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Self; 3] = [Self::Postgres, Self::Mysql, Self::Sqlite];

    /// Resolves a configuration selector.
    ///
    /// Accepted selectors: `postgres`, `mysql`, `better-sqlite3`, `sqlite`
    /// (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownDialect`] for any other value.
    pub fn resolve(raw: &str) -> Result<Self, ConfigurationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            "better-sqlite3" | "sqlite" => Ok(Self::Sqlite),
            _ => Err(ConfigurationError::UnknownDialect(raw.to_string())),
        }
    }

    /// Returns the canonical selector.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns true for the embedded dialect.
    #[must_use]
    pub const fn is_embedded(self) -> bool {
        matches!(self, Self::Sqlite)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::resolve(value)
    }
}

// ============================================================================
// SECTION: Physical Types
// ============================================================================

/// Physical type names a dialect uses for each logical family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalTypes {
    /// Fixed-width binary (secrets, password hashes).
    pub binary: &'static str,
    /// Variable-width binary (tokens).
    pub token_binary: &'static str,
    /// 32-bit integer.
    pub integer: &'static str,
    /// 64-bit integer.
    pub big_integer: &'static str,
    /// Bounded string.
    pub string: &'static str,
    /// Unbounded text.
    pub long_text: &'static str,
    /// Date-time.
    pub timestamp: &'static str,
    /// Identifier column type.
    pub identifier: &'static str,
    /// Identifier length hint.
    pub identifier_length: Option<u32>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dialect configuration errors. Always fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Selector names no supported dialect.
    #[error("unsupported database type: {0}")]
    UnknownDialect(String),
    /// A different dialect was already installed for this process.
    #[error("dialect already installed as {installed}; refusing {requested}")]
    AlreadyInstalled {
        /// Dialect installed first.
        installed: Dialect,
        /// Dialect requested later.
        requested: Dialect,
    },
    /// Registry queried before installation.
    #[error("dialect registry not initialized")]
    NotInstalled,
}

/// DDL the dialect cannot express directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DdlError {
    /// Operation requires the table-rebuild protocol.
    #[error("{dialect} cannot {operation} directly; rebuild the table instead")]
    Unsupported {
        /// Dialect lacking the operation.
        dialect: Dialect,
        /// Operation label.
        operation: &'static str,
    },
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Active dialect for the process lifetime.
static ACTIVE_DIALECT: OnceLock<Dialect> = OnceLock::new();

/// Process-wide dialect registry.
///
/// # Invariants
/// - Once installed, the active dialect never changes until restart.
pub struct DialectRegistry;

impl DialectRegistry {
    /// Installs the active dialect.
    ///
    /// Installing the already-active dialect again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::AlreadyInstalled`] when a different
    /// dialect is already active.
    pub fn install(dialect: Dialect) -> Result<Dialect, ConfigurationError> {
        let installed = *ACTIVE_DIALECT.get_or_init(|| dialect);
        if installed == dialect {
            Ok(installed)
        } else {
            Err(ConfigurationError::AlreadyInstalled {
                installed,
                requested: dialect,
            })
        }
    }

    /// Resolves a selector and installs the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the selector is unknown or a
    /// different dialect is already active.
    pub fn install_from(raw: &str) -> Result<Dialect, ConfigurationError> {
        Self::install(Dialect::resolve(raw)?)
    }

    /// Returns the active dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NotInstalled`] before installation.
    pub fn current() -> Result<Dialect, ConfigurationError> {
        ACTIVE_DIALECT.get().copied().ok_or(ConfigurationError::NotInstalled)
    }

    /// Returns true when `dialect` is the active dialect.
    #[must_use]
    pub fn is_dialect(dialect: Dialect) -> bool {
        ACTIVE_DIALECT.get().is_some_and(|active| *active == dialect)
    }

    /// Returns the strategy for the active dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NotInstalled`] before installation.
    pub fn strategy() -> Result<Arc<dyn DialectStrategy>, ConfigurationError> {
        Ok(strategy_for(Self::current()?))
    }
}

/// Returns the strategy implementing `dialect`.
#[must_use]
pub fn strategy_for(dialect: Dialect) -> Arc<dyn DialectStrategy> {
    match dialect {
        Dialect::Postgres => Arc::new(PostgresDialect),
        Dialect::Mysql => Arc::new(MysqlDialect),
        Dialect::Sqlite => Arc::new(SqliteDialect),
    }
}
