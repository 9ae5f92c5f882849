// polyglot-core/tests/dialect_registry.rs
// ============================================================================
// Module: Dialect Registry Tests
// Description: Selector resolution and the process-wide install lifecycle.
// Purpose: Ensure unknown selectors fail closed and the dialect never changes.
// Dependencies: polyglot-core
// ============================================================================

//! ## Overview
//! The registry is process-global, so its lifecycle is exercised by a single
//! test in this binary. Selector resolution is pure and tested separately.

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

use polyglot_core::ConfigurationError;
use polyglot_core::Dialect;
use polyglot_core::DialectRegistry;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn selectors_resolve_to_supported_dialects() {
    assert_eq!(Dialect::resolve("postgres").unwrap(), Dialect::Postgres);
    assert_eq!(Dialect::resolve("mysql").unwrap(), Dialect::Mysql);
    assert_eq!(Dialect::resolve("better-sqlite3").unwrap(), Dialect::Sqlite);
    assert_eq!(Dialect::resolve(" SQLite ").unwrap(), Dialect::Sqlite);
    assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::Mysql);
}

#[test]
fn unknown_selectors_fail_closed() {
    for raw in ["oracle", "", "mariadb", "postgresql"] {
        assert_eq!(
            Dialect::resolve(raw),
            Err(ConfigurationError::UnknownDialect(raw.to_string()))
        );
    }
}

#[test]
fn registry_installs_once_and_never_switches() {
    assert_eq!(DialectRegistry::current(), Err(ConfigurationError::NotInstalled));
    assert!(DialectRegistry::strategy().is_err());
    assert!(!DialectRegistry::is_dialect(Dialect::Sqlite));

    assert!(matches!(
        DialectRegistry::install_from("cockroach"),
        Err(ConfigurationError::UnknownDialect(_))
    ));
    assert_eq!(DialectRegistry::current(), Err(ConfigurationError::NotInstalled));

    assert_eq!(DialectRegistry::install_from("better-sqlite3").unwrap(), Dialect::Sqlite);
    assert_eq!(DialectRegistry::install(Dialect::Sqlite).unwrap(), Dialect::Sqlite);
    assert_eq!(
        DialectRegistry::install(Dialect::Postgres),
        Err(ConfigurationError::AlreadyInstalled {
            installed: Dialect::Sqlite,
            requested: Dialect::Postgres,
        })
    );
    assert_eq!(DialectRegistry::current().unwrap(), Dialect::Sqlite);
    assert!(DialectRegistry::is_dialect(Dialect::Sqlite));
    assert!(!DialectRegistry::is_dialect(Dialect::Mysql));
    assert_eq!(DialectRegistry::strategy().unwrap().dialect(), Dialect::Sqlite);
}
