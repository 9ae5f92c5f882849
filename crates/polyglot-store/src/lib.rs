// polyglot-store/src/lib.rs
// ============================================================================
// Module: Polyglot Store Library
// Description: Engine drivers implementing the statement executor interface.
// Purpose: Open databases for the configured dialect and hand out executors.
// Dependencies: polyglot-core, rusqlite, postgres, r2d2, mysql (optional)
// ============================================================================

//! ## Overview
//! A [`Database`] hands out [`polyglot_core::SqlExecutor`]s bound to one
//! connection each, so a transaction never spans connections. `SQLite` opens
//! a fresh connection per executor; Postgres and MySQL draw from a pool.
//! MySQL support is compiled in with the `mysql` feature.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
#[cfg(feature = "mysql")]
pub mod mysql_store;
pub mod postgres_store;
pub mod sqlite_store;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use polyglot_core::Dialect;
use polyglot_core::SqlExecutor;
use thiserror::Error;

pub use config::MysqlStoreConfig;
pub use config::PostgresStoreConfig;
pub use config::SqliteStoreConfig;
pub use config::SqliteStoreMode;
pub use config::SqliteSyncMode;
pub use config::StoreConfig;
#[cfg(feature = "mysql")]
pub use mysql_store::MysqlDatabase;
pub use postgres_store::PostgresDatabase;
pub use sqlite_store::SqliteDatabase;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while opening a database.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("store io error: {0}")]
    Io(String),
    /// Engine or pool error.
    #[error("store db error: {0}")]
    Db(String),
    /// Invalid store configuration.
    #[error("store invalid configuration: {0}")]
    Invalid(String),
    /// Driver not compiled into this build.
    #[error("store driver unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// Source of single-connection executors for one database.
pub trait Database: Send + Sync {
    /// Returns the dialect of the engine.
    fn dialect(&self) -> Dialect;

    /// Returns an executor bound to one connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when no connection can be obtained.
    fn executor(&self) -> Result<Box<dyn SqlExecutor>, StoreError>;
}

/// Shared database handle.
pub type SharedDatabase = Arc<dyn Database>;

/// Opens the database described by `config`.
///
/// # Errors
///
/// Returns [`StoreError`] when the configuration is invalid, the engine is
/// unreachable, or the driver is not compiled in.
pub fn open_database(config: &StoreConfig) -> Result<SharedDatabase, StoreError> {
    match config {
        StoreConfig::Sqlite(sqlite) => Ok(Arc::new(SqliteDatabase::open(sqlite.clone())?)),
        StoreConfig::Postgres(postgres) => Ok(Arc::new(PostgresDatabase::open(postgres)?)),
        StoreConfig::Mysql(mysql) => open_mysql(mysql),
    }
}

/// Opens a MySQL database.
#[cfg(feature = "mysql")]
fn open_mysql(config: &MysqlStoreConfig) -> Result<SharedDatabase, StoreError> {
    Ok(Arc::new(MysqlDatabase::open(config)?))
}

/// Reports that MySQL support is not compiled in.
#[cfg(not(feature = "mysql"))]
fn open_mysql(_config: &MysqlStoreConfig) -> Result<SharedDatabase, StoreError> {
    Err(StoreError::Unavailable("rebuild with the `mysql` feature to use MySQL".to_string()))
}
