// polyglot-core/src/interfaces/mod.rs
// ============================================================================
// Module: Polyglot Interfaces
// Description: Storage executor seam shared by migrations and authorization.
// Purpose: Keep engine drivers behind one object-safe trait.
// Dependencies: thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqlExecutor`] is the only way the migration engine and the authorization
//! service touch storage. Statements carry positional parameters as
//! [`SqlValue`]s and use the placeholder syntax of the executor's dialect.
//! [`with_transaction`] provides the commit-or-rollback scope every unit of
//! work runs in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::dialect::Dialect;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Parameter or column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Integer.
    Integer(i64),
    /// Text.
    Text(String),
    /// Binary.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the integer value, parsing text when the driver returned text.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(value) => value.trim().parse().ok(),
            Self::Null | Self::Blob(_) => None,
        }
    }

    /// Returns the text value, decoding UTF-8 blobs.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Blob(bytes) => String::from_utf8(bytes.clone()).ok(),
            Self::Integer(value) => Some(value.to_string()),
            Self::Null => None,
        }
    }

    /// Returns true for NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

/// One result row, columns in select order.
pub type SqlRow = Vec<SqlValue>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Executor failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// Connection could not be obtained or was lost; the caller may retry.
    #[error("storage connection error: {0}")]
    Connection(String),
    /// Statement was rejected by the engine.
    #[error("storage statement error: {0}")]
    Statement(String),
    /// Result value could not be decoded.
    #[error("storage decode error: {0}")]
    Decode(String),
    /// Transaction control failed.
    #[error("storage transaction error: {0}")]
    Transaction(String),
}

impl ExecutorError {
    /// Returns true for failures worth retrying from the top.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Transactional statement executor for one connection.
pub trait SqlExecutor: Send {
    /// Returns the dialect of the underlying engine.
    fn dialect(&self) -> Dialect;

    /// Executes a statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the engine rejects the statement.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, ExecutorError>;

    /// Executes a query and returns every row.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the engine rejects the query or a value
    /// cannot be decoded.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, ExecutorError>;

    /// Opens a transaction that takes the write lock where the engine allows.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Transaction`] when the transaction cannot start.
    fn begin(&mut self) -> Result<(), ExecutorError>;

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Transaction`] when the commit fails.
    fn commit(&mut self) -> Result<(), ExecutorError>;

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Transaction`] when the rollback fails.
    fn rollback(&mut self) -> Result<(), ExecutorError>;
}

/// Runs `work` inside a transaction, committing on `Ok` and rolling back on `Err`.
///
/// # Errors
///
/// Returns the error produced by `work`, or the begin/commit failure.
pub fn with_transaction<T, E, F>(executor: &mut dyn SqlExecutor, work: F) -> Result<T, E>
where
    E: From<ExecutorError>,
    F: FnOnce(&mut dyn SqlExecutor) -> Result<T, E>,
{
    executor.begin()?;
    match work(&mut *executor) {
        Ok(value) => {
            executor.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = executor.rollback() {
                tracing::warn!(error = %rollback_err, "rollback failed after aborted transaction");
            }
            Err(err)
        }
    }
}
