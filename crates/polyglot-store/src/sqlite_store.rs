// polyglot-store/src/sqlite_store.rs
// ============================================================================
// Module: SQLite Store
// Description: SqlExecutor backed by a rusqlite connection.
// Purpose: Run migrations and authorization against an embedded database file.
// Dependencies: polyglot-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! Each executor owns its own connection to the database file, opened with
//! WAL journaling and a busy timeout so concurrent writers queue instead of
//! failing. `begin` issues `BEGIN IMMEDIATE`, taking the write lock at the
//! start of the transaction; this is the row-lock equivalent for `SQLite`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::time::Duration;

use polyglot_core::Dialect;
use polyglot_core::ExecutorError;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlRow;
use polyglot_core::SqlValue;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use rusqlite::types::ValueRef;

use crate::Database;
use crate::StoreError;
use crate::config::SqliteStoreConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Database
// ============================================================================

/// `SQLite` database file.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    /// Store configuration.
    config: SqliteStoreConfig,
}

impl SqliteDatabase {
    /// Validates the path, creates the parent directory and checks the file opens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the path is invalid or the file cannot be opened.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, StoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        drop(open_connection(&config)?);
        tracing::debug!(path = %config.path.display(), "sqlite store opened");
        Ok(Self {
            config,
        })
    }

    /// Opens a dedicated executor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the connection cannot be opened.
    pub fn connect(&self) -> Result<SqliteExecutor, StoreError> {
        Ok(SqliteExecutor {
            connection: open_connection(&self.config)?,
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn executor(&self) -> Result<Box<dyn SqlExecutor>, StoreError> {
        Ok(Box::new(self.connect()?))
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executor over one `SQLite` connection.
pub struct SqliteExecutor {
    /// Owned connection.
    connection: Connection,
}

impl SqliteExecutor {
    /// Runs a parameterless batch.
    fn batch(&self, sql: &str) -> Result<(), ExecutorError> {
        self.connection.execute_batch(sql).map_err(|err| ExecutorError::Transaction(err.to_string()))
    }
}

impl SqlExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, ExecutorError> {
        let mut statement = self.connection.prepare(sql).map_err(statement_error)?;
        let values = params.iter().map(to_sqlite_value);
        if statement.column_count() > 0 {
            let mut rows = statement.query(params_from_iter(values)).map_err(statement_error)?;
            while rows.next().map_err(statement_error)?.is_some() {}
            return Ok(0);
        }
        let affected = statement.execute(params_from_iter(values)).map_err(statement_error)?;
        u64::try_from(affected).map_err(|err| ExecutorError::Decode(err.to_string()))
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, ExecutorError> {
        let mut statement = self.connection.prepare(sql).map_err(statement_error)?;
        let width = statement.column_count();
        let mut rows =
            statement.query(params_from_iter(params.iter().map(to_sqlite_value))).map_err(statement_error)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(statement_error)? {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                let value = row.get_ref(index).map_err(|err| ExecutorError::Decode(err.to_string()))?;
                values.push(from_sqlite_value(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    fn begin(&mut self) -> Result<(), ExecutorError> {
        self.batch("BEGIN IMMEDIATE")
    }

    fn commit(&mut self) -> Result<(), ExecutorError> {
        self.batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), ExecutorError> {
        self.batch("ROLLBACK")
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a parameter into a rusqlite value.
fn to_sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => Value::Integer(*value),
        SqlValue::Text(value) => Value::Text(value.clone()),
        SqlValue::Blob(value) => Value::Blob(value.clone()),
    }
}

/// Converts a column value into a [`SqlValue`].
fn from_sqlite_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(value) => SqlValue::Integer(value),
        ValueRef::Real(value) => SqlValue::Text(value.to_string()),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}

/// Maps rusqlite errors, treating lock contention as a connection failure.
fn statement_error(err: rusqlite::Error) -> ExecutorError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            ExecutorError::Connection(err.to_string())
        }
        _ => ExecutorError::Statement(err.to_string()),
    }
}

/// Ensures the parent directory exists.
fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), StoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(StoreError::Invalid("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(connection)
}
