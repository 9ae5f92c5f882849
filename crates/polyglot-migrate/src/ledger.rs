// polyglot-migrate/src/ledger.rs
// ============================================================================
// Module: Migration Ledger
// Description: Persistent record of applied migration versions.
// Purpose: Provide the high-water mark that makes reruns idempotent.
// Dependencies: polyglot-core
// ============================================================================

//! ## Overview
//! The ledger is an ordinary table created by the first migration unit. Each
//! applied unit adds one row; reverting removes it. A missing table reads as
//! an empty ledger so the very first run can start from nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use polyglot_core::ColumnKind;
use polyglot_core::DialectStrategy;
use polyglot_core::ExecutorError;
use polyglot_core::MysqlCollation;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlValue;
use polyglot_core::TableBuilder;
use polyglot_core::TableDef;

use crate::unit::MigrationVersion;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Ledger table name.
pub const LEDGER_TABLE: &str = "migration_ledger";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One applied unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Applied version.
    pub version: i64,
    /// Label recorded at apply time.
    pub label: String,
    /// Apply time in unix milliseconds.
    pub applied_at_ms: i64,
}

/// Returns the ledger table shape.
#[must_use]
pub fn ledger_table(strategy: &dyn DialectStrategy) -> TableDef {
    TableBuilder::new(strategy, LEDGER_TABLE)
        .column("version", ColumnKind::BigInteger)
        .column(
            "label",
            ColumnKind::ShortText {
                length: 255,
            },
        )
        .column("applied_at_ms", ColumnKind::BigInteger)
        .primary_key(&["version"])
        .collation(MysqlCollation::UnicodeCi)
        .build()
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Returns true when `table` exists.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the catalog query fails.
pub fn table_exists(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
    table: &str,
) -> Result<bool, ExecutorError> {
    let rows = executor.query(&strategy.table_exists_sql(), &[SqlValue::from(table)])?;
    Ok(!rows.is_empty())
}

/// Reads every ledger row in ascending version order.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the ledger cannot be read or decoded.
pub fn read_entries(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
) -> Result<Vec<LedgerEntry>, ExecutorError> {
    if !table_exists(executor, strategy, LEDGER_TABLE)? {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {}, {}, {} FROM {} ORDER BY {}",
        strategy.quote_column("version"),
        strategy.quote_column("label"),
        strategy.quote_column("applied_at_ms"),
        strategy.quote_identifier(LEDGER_TABLE),
        strategy.quote_column("version")
    );
    executor
        .query(&sql, &[])?
        .into_iter()
        .map(|row| {
            let version = row.first().and_then(SqlValue::as_i64);
            let label = row.get(1).and_then(SqlValue::as_text);
            let applied_at_ms = row.get(2).and_then(SqlValue::as_i64);
            match (version, label, applied_at_ms) {
                (Some(version), Some(label), Some(applied_at_ms)) => Ok(LedgerEntry {
                    version,
                    label,
                    applied_at_ms,
                }),
                _ => Err(ExecutorError::Decode("malformed migration ledger row".to_string())),
            }
        })
        .collect()
}

/// Returns the highest applied version, 0 for an empty ledger.
#[must_use]
pub fn high_water_mark(entries: &[LedgerEntry]) -> i64 {
    entries.iter().map(|entry| entry.version).max().unwrap_or(0)
}

/// Returns true when `version` is recorded.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the ledger cannot be read.
pub fn is_recorded(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
    version: MigrationVersion,
) -> Result<bool, ExecutorError> {
    if !table_exists(executor, strategy, LEDGER_TABLE)? {
        return Ok(false);
    }
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} = {}",
        strategy.quote_identifier(LEDGER_TABLE),
        strategy.quote_column("version"),
        strategy.placeholder(1)
    );
    let rows = executor.query(&sql, &[SqlValue::Integer(version.as_i64())])?;
    Ok(!rows.is_empty())
}

/// Records an applied unit.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the insert fails.
pub fn record(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
    version: MigrationVersion,
    label: &str,
) -> Result<(), ExecutorError> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}, {}, {})",
        strategy.quote_identifier(LEDGER_TABLE),
        strategy.column_list(&[
            "version".to_string(),
            "label".to_string(),
            "applied_at_ms".to_string()
        ]),
        strategy.placeholder(1),
        strategy.placeholder(2),
        strategy.placeholder(3)
    );
    executor.execute(
        &sql,
        &[SqlValue::Integer(version.as_i64()), SqlValue::from(label), SqlValue::Integer(now_ms())],
    )?;
    Ok(())
}

/// Removes a unit's row.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the delete fails.
pub fn remove(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
    version: MigrationVersion,
) -> Result<(), ExecutorError> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        strategy.quote_identifier(LEDGER_TABLE),
        strategy.quote_column("version"),
        strategy.placeholder(1)
    );
    executor.execute(&sql, &[SqlValue::Integer(version.as_i64())])?;
    Ok(())
}

/// Returns the current unix time in milliseconds.
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok())
        .unwrap_or(0)
}
