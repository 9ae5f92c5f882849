// polyglot-cli/tests/bootstrap.rs
// ============================================================================
// Module: Bootstrap Tests
// Description: Startup sequence over a temporary SQLite database.
// Purpose: Ensure startup migrates, wires authorization, and renders results.
// Dependencies: polyglot-cli, polyglot-config, polyglot-core, tempfile
// ============================================================================

//! ## Overview
//! Every test in this binary installs the `SQLite` dialect; the registry is
//! process-wide, so a test that asks for another dialect expects a refusal.

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

use polyglot_authz::AuthzError;
use polyglot_authz::QuotaDelta;
use polyglot_cli::BootstrapError;
use polyglot_cli::bootstrap;
use polyglot_cli::open_storage;
use polyglot_cli::render;
use polyglot_config::PolyglotConfig;
use polyglot_core::Dialect;
use polyglot_core::Principal;
use polyglot_core::ProjectAction;
use polyglot_core::ProjectId;
use polyglot_core::UserId;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn sqlite_config(dir: &TempDir, auto_migrate: bool) -> PolyglotConfig {
    let content = format!(
        "[database]\ntype = \"sqlite\"\npath = '{}'\n\n[migrations]\nauto_migrate = \
         {auto_migrate}\n\n[audit]\nsink = \"none\"\n",
        dir.path().join("polyglot.sqlite3").to_string_lossy()
    );
    let config = PolyglotConfig::parse(&content).expect("parse config");
    config.validate().expect("valid config");
    config
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn startup_migrates_once_and_wires_authorization() {
    let dir = TempDir::new().expect("tempdir");
    let config = sqlite_config(&dir, true);

    let runtime = bootstrap(&config).expect("bootstrap");
    assert_eq!(runtime.storage().dialect(), Dialect::Sqlite);
    let report = runtime.startup_migration().expect("startup migration ran");
    assert_eq!(report.applied.len(), 19);
    assert_eq!(report.current_version, 19);

    let mut executor = runtime.storage().database().executor().expect("executor");
    let err = runtime
        .authz()
        .authorize(
            executor.as_mut(),
            &Principal::User(UserId::new("nobody")),
            &ProjectId::new("missing"),
            ProjectAction::ViewProject,
            QuotaDelta::ZERO,
        )
        .unwrap_err();
    assert_eq!(err, AuthzError::NotFound);

    let again = bootstrap(&config).expect("second bootstrap");
    assert!(again.startup_migration().unwrap().is_noop());
    assert_eq!(render::report_lines(again.startup_migration().unwrap()), vec![
        "schema up to date at version 19".to_string()
    ]);
}

#[test]
fn disabled_auto_migrate_leaves_units_pending() {
    let dir = TempDir::new().expect("tempdir");
    let config = sqlite_config(&dir, false);

    let runtime = bootstrap(&config).expect("bootstrap");
    assert!(runtime.startup_migration().is_none());
    let mut executor = runtime.storage().database().executor().expect("executor");
    let statuses = runtime.storage().migrator().status(executor.as_mut()).expect("status");
    assert_eq!(statuses.len(), 19);
    let lines = render::status_lines(&statuses);
    assert!(lines[0].starts_with("001 create-migration-ledger"));
    assert!(lines.iter().all(|line| line.contains("pending")));

    let report = runtime.storage().migrate().expect("migrate");
    let lines = render::report_lines(&report);
    assert_eq!(lines.first().map(String::as_str), Some("applied  001 create-migration-ledger"));
    assert_eq!(lines.last().map(String::as_str), Some("schema version 0 -> 19"));
}

#[test]
fn other_dialect_after_install_is_refused() {
    let dir = TempDir::new().expect("tempdir");
    bootstrap(&sqlite_config(&dir, false)).expect("sqlite bootstrap");

    let mut config = sqlite_config(&dir, false);
    config.database.db_type = "postgres".to_string();
    let err = open_storage(&config).err().expect("registry refuses a second dialect");
    assert!(matches!(err, BootstrapError::Registry(_)));
}

#[test]
fn column_catalog_covers_factory_kinds() {
    for dialect in Dialect::ALL {
        let catalog = render::column_catalog(dialect);
        let kinds: Vec<&str> = catalog.iter().map(|entry| entry.kind).collect();
        assert_eq!(kinds, vec![
            "binary-secret",
            "binary-token",
            "enumerated-role",
            "enumerated-status",
            "timestamp",
            "timestamp-with-precision",
            "counter",
        ]);
    }
    let json = render::column_catalog_json(Dialect::Mysql).expect("json");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse json");
    assert_eq!(parsed.as_array().map(Vec::len), Some(7));
    assert_eq!(parsed[0]["kind"], "binary-secret");
}
