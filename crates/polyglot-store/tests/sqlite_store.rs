// polyglot-store/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Executor behavior over an SQLite database file.
// Purpose: Ensure statements, transactions and value decoding behave as the
//          migration engine and authorization service expect.
// Dependencies: polyglot-store, polyglot-core, tempfile
// ============================================================================

//! ## Overview
//! Exercises the `SQLite` executor: parameter binding, row decoding,
//! transaction scoping, row-returning pragmas, and path validation.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_core::Dialect;
use polyglot_core::ExecutorError;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlValue;
use polyglot_core::with_transaction;
use polyglot_store::Database;
use polyglot_store::MysqlStoreConfig;
use polyglot_store::PostgresStoreConfig;
use polyglot_store::SqliteDatabase;
use polyglot_store::SqliteStoreConfig;
use polyglot_store::StoreConfig;
use polyglot_store::StoreError;
use polyglot_store::open_database;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn database(dir: &TempDir) -> SqliteDatabase {
    SqliteDatabase::open(SqliteStoreConfig::at(dir.path().join("nested").join("store.db")))
        .expect("open sqlite database")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn executes_statements_and_decodes_rows() {
    let dir = TempDir::new().expect("tempdir");
    let db = database(&dir);
    let mut executor = db.executor().expect("executor");
    assert_eq!(executor.dialect(), Dialect::Sqlite);
    executor
        .execute("CREATE TABLE item (id varchar(36) PRIMARY KEY, count integer, data blob)", &[])
        .unwrap();
    let inserted = executor
        .execute(
            "INSERT INTO item (id, count, data) VALUES (?1, ?2, ?3)",
            &[SqlValue::from("a"), SqlValue::from(7), SqlValue::Blob(vec![1, 2])],
        )
        .unwrap();
    assert_eq!(inserted, 1);
    executor
        .execute("INSERT INTO item (id, count, data) VALUES (?1, ?2, ?3)", &[
            SqlValue::from("b"),
            SqlValue::Null,
            SqlValue::Null,
        ])
        .unwrap();

    let rows = executor.query("SELECT id, count, data FROM item ORDER BY id", &[]).unwrap();
    assert_eq!(rows, vec![
        vec![SqlValue::from("a"), SqlValue::Integer(7), SqlValue::Blob(vec![1, 2])],
        vec![SqlValue::from("b"), SqlValue::Null, SqlValue::Null],
    ]);
}

#[test]
fn pragmas_returning_rows_run_through_execute() {
    let dir = TempDir::new().expect("tempdir");
    let db = database(&dir);
    let mut executor = db.executor().unwrap();
    executor.execute("PRAGMA foreign_keys = OFF", &[]).unwrap();
    executor.execute("PRAGMA foreign_key_check", &[]).unwrap();
    let rows = executor.query("PRAGMA foreign_keys", &[]).unwrap();
    assert_eq!(rows, vec![vec![SqlValue::Integer(0)]]);
}

#[test]
fn failed_transactions_roll_back() {
    let dir = TempDir::new().expect("tempdir");
    let db = database(&dir);
    let mut executor = db.executor().unwrap();
    executor.execute("CREATE TABLE counter (value integer NOT NULL)", &[]).unwrap();

    let result: Result<(), ExecutorError> = with_transaction(executor.as_mut(), |tx| {
        tx.execute("INSERT INTO counter (value) VALUES (1)", &[])?;
        tx.execute("INSERT INTO counter (value) VALUES (NULL)", &[])?;
        Ok(())
    });
    assert!(matches!(result, Err(ExecutorError::Statement(_))));

    with_transaction::<_, ExecutorError, _>(executor.as_mut(), |tx| {
        tx.execute("INSERT INTO counter (value) VALUES (2)", &[])
    })
    .unwrap();
    let rows = executor.query("SELECT value FROM counter", &[]).unwrap();
    assert_eq!(rows, vec![vec![SqlValue::Integer(2)]]);
}

#[test]
fn executors_share_the_database_file() {
    let dir = TempDir::new().expect("tempdir");
    let db = database(&dir);
    let mut first = db.connect().unwrap();
    let mut second = db.connect().unwrap();
    first.execute("CREATE TABLE shared (id integer)", &[]).unwrap();
    first.execute("INSERT INTO shared (id) VALUES (?1)", &[SqlValue::Integer(5)]).unwrap();
    let rows = second.query("SELECT id FROM shared", &[]).unwrap();
    assert_eq!(rows[0][0].as_i64(), Some(5));
}

#[test]
fn rejects_directory_paths() {
    let dir = TempDir::new().expect("tempdir");
    let result = SqliteDatabase::open(SqliteStoreConfig::at(dir.path()));
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn open_database_dispatches_on_engine() {
    let dir = TempDir::new().expect("tempdir");
    let config = StoreConfig::Sqlite(SqliteStoreConfig::at(dir.path().join("db.sqlite")));
    assert_eq!(config.dialect(), Dialect::Sqlite);
    let db = open_database(&config).unwrap();
    assert_eq!(db.dialect(), Dialect::Sqlite);

    let invalid = StoreConfig::Postgres(PostgresStoreConfig {
        connection: "host=localhost port=not-a-port".to_string(),
        ..PostgresStoreConfig::default()
    });
    assert!(matches!(open_database(&invalid), Err(StoreError::Invalid(_))));

    let mysql = StoreConfig::Mysql(MysqlStoreConfig {
        connection: "not a url".to_string(),
        ..MysqlStoreConfig::default()
    });
    assert!(matches!(
        open_database(&mysql),
        Err(StoreError::Unavailable(_) | StoreError::Invalid(_))
    ));
}
