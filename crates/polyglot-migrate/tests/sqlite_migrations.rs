// polyglot-migrate/tests/sqlite_migrations.rs
// ============================================================================
// Module: SQLite Migration Tests
// Description: Schema history applied to a real SQLite database file.
// Purpose: Ensure units apply once, rebuilds keep data, and reverts restore
//          earlier shapes.
// Dependencies: polyglot-migrate, polyglot-store, polyglot-core, tempfile
// ============================================================================

//! ## Overview
//! Runs the built-in catalog against a temporary `SQLite` file and inspects
//! the resulting schema through `sqlite_master` and `pragma_table_info`.

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

use std::sync::Arc;

use polyglot_core::ColumnKind;
use polyglot_core::Dialect;
use polyglot_core::DialectStrategy;
use polyglot_core::PostgresDialect;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlValue;
use polyglot_core::SqliteDialect;
use polyglot_core::TableBuilder;
use polyglot_migrate::ColumnMapping;
use polyglot_migrate::MigrationCatalog;
use polyglot_migrate::MigrationContext;
use polyglot_migrate::MigrationError;
use polyglot_migrate::MigrationUnit;
use polyglot_migrate::MigrationVersion;
use polyglot_migrate::Migrator;
use polyglot_migrate::Reversibility;
use polyglot_migrate::ShadowRebuild;
use polyglot_migrate::StepError;
use polyglot_migrate::UnitState;
use polyglot_migrate::migrations::standard_units;
use polyglot_store::Database;
use polyglot_store::SqliteDatabase;
use polyglot_store::SqliteStoreConfig;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn executor(dir: &TempDir) -> Box<dyn SqlExecutor> {
    let db = SqliteDatabase::open(SqliteStoreConfig::at(dir.path().join("polyglot.db")))
        .expect("open sqlite database");
    db.executor().expect("executor")
}

fn migrator() -> Migrator {
    Migrator::standard(Arc::new(SqliteDialect)).expect("standard catalog")
}

fn prefix(count: usize) -> Migrator {
    let units = standard_units().into_iter().take(count).collect();
    Migrator::new(MigrationCatalog::new(units).expect("catalog"), Arc::new(SqliteDialect))
}

fn columns(executor: &mut dyn SqlExecutor, table: &str) -> Vec<String> {
    executor
        .query("SELECT name FROM pragma_table_info(?1) ORDER BY cid", &[SqlValue::from(table)])
        .expect("table info")
        .into_iter()
        .filter_map(|row| row.first().and_then(SqlValue::as_text))
        .collect()
}

fn count(executor: &mut dyn SqlExecutor, sql: &str) -> i64 {
    let rows = executor.query(sql, &[]).expect("count query");
    rows.first().and_then(|row| row.first()).and_then(SqlValue::as_i64).expect("count value")
}

fn object_count(executor: &mut dyn SqlExecutor, name: &str) -> i64 {
    let rows = executor
        .query("SELECT COUNT(*) FROM sqlite_master WHERE name = ?1", &[SqlValue::from(name)])
        .expect("sqlite_master");
    rows.first().and_then(|row| row.first()).and_then(SqlValue::as_i64).expect("count value")
}

fn insert_user(executor: &mut dyn SqlExecutor, id: &str, email: &str) {
    executor
        .execute(
            "INSERT INTO \"user\" (id, name, email, encrypted_password) VALUES (?1, ?2, ?3, ?4)",
            &[SqlValue::from(id), SqlValue::from("Ada"), SqlValue::from(email), SqlValue::Blob(vec![
                1, 2, 3,
            ])],
        )
        .expect("insert user");
}

/// Unit that creates a table and then fails.
struct BrokenUnit;

impl MigrationUnit for BrokenUnit {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(2)
    }

    fn label(&self) -> &'static str {
        "broken"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        ctx.execute("CREATE TABLE scratch (id integer)")?;
        ctx.execute("THIS IS NOT SQL")
    }

    fn down(&self, _ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        Ok(())
    }
}

/// Unit that rebuilds `user` with a required column nothing can fill.
struct UnfillableColumnRebuild;

impl MigrationUnit for UnfillableColumnRebuild {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(20)
    }

    fn label(&self) -> &'static str {
        "add-required-badge"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let target = TableBuilder::new(ctx.strategy(), "user")
            .column("id", ColumnKind::Identifier)
            .column("email", ColumnKind::ShortText {
                length: 255,
            })
            .column("badge", ColumnKind::Integer)
            .primary_key(&["id"])
            .build();
        ShadowRebuild::new(target).run(ctx)?;
        Ok(())
    }

    fn down(&self, _ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        Ok(())
    }
}

fn schema(executor: &mut dyn SqlExecutor) -> Vec<Vec<SqlValue>> {
    executor
        .query(
            "SELECT type, name, tbl_name, sql FROM sqlite_master WHERE name NOT LIKE 'sqlite_%' \
             ORDER BY type, name",
            &[],
        )
        .expect("sqlite_master")
}

fn triggers_on(executor: &mut dyn SqlExecutor, table: &str) -> Vec<Vec<SqlValue>> {
    executor
        .query(
            "SELECT name, sql FROM sqlite_master WHERE type = 'trigger' AND tbl_name = ?1 ORDER BY \
             name",
            &[SqlValue::from(table)],
        )
        .expect("triggers")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn full_history_applies_once() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    let migrator = migrator();

    let report = migrator.run_pending(executor.as_mut()).expect("run");
    assert_eq!(report.applied.len(), 19);
    assert_eq!(report.previous_version, 0);
    assert_eq!(report.current_version, 19);
    assert_eq!(report.applied[0].label, "create-migration-ledger");
    assert_eq!(report.applied[18].version, MigrationVersion::new(19));

    let rerun = migrator.run_pending(executor.as_mut()).expect("rerun");
    assert!(rerun.is_noop());
    assert_eq!(rerun.previous_version, 19);
    assert_eq!(rerun.current_version, 19);
    assert_eq!(count(executor.as_mut(), "SELECT COUNT(*) FROM migration_ledger"), 19);

    let plans = executor.query("SELECT code, max_strings FROM plan ORDER BY code", &[]).unwrap();
    assert_eq!(plans, vec![
        vec![SqlValue::from("default"), SqlValue::Integer(100)],
        vec![SqlValue::from("open-source"), SqlValue::Integer(100_000)],
    ]);
    assert_eq!(columns(executor.as_mut(), "translation"), vec![
        "term_id",
        "project_locale_id",
        "value",
        "date_created",
        "date_modified"
    ]);
}

#[test]
fn rebuild_keeps_rows_and_drops_removed_columns() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    prefix(11).run_pending(executor.as_mut()).expect("first eleven");
    assert!(columns(executor.as_mut(), "user").contains(&"tos_and_privacy_accepted_date".to_string()));

    insert_user(executor.as_mut(), "u1", "ada@example.com");
    executor
        .execute("INSERT INTO project (id, name, plan_code) VALUES ('p1', 'Docs', 'default')", &[])
        .unwrap();
    executor
        .execute(
            "INSERT INTO project_user (id, project_id, user_id, role) VALUES ('m1', 'p1', 'u1', 'admin')",
            &[],
        )
        .unwrap();

    let report = migrator().run_pending(executor.as_mut()).expect("remaining units");
    assert_eq!(report.previous_version, 11);
    assert_eq!(report.applied.len(), 8);

    let user_columns = columns(executor.as_mut(), "user");
    assert!(!user_columns.contains(&"tos_and_privacy_accepted_date".to_string()));
    assert!(!user_columns.contains(&"tos_and_privacy_accepted_version".to_string()));
    assert!(user_columns.contains(&"num_projects_created".to_string()));
    let users = executor.query("SELECT id, email, num_projects_created FROM \"user\"", &[]).unwrap();
    assert_eq!(users, vec![vec![
        SqlValue::from("u1"),
        SqlValue::from("ada@example.com"),
        SqlValue::Integer(0)
    ]]);

    // Parent-side triggers on the rebuilt table still cascade.
    executor.execute("DELETE FROM \"user\" WHERE id = 'u1'", &[]).unwrap();
    assert_eq!(count(executor.as_mut(), "SELECT COUNT(*) FROM project_user"), 0);
    assert_eq!(object_count(executor.as_mut(), "IDX_20543d6caa7324ce6706fad2f5"), 1);
}

#[test]
fn password_becomes_nullable() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    migrator().run_pending(executor.as_mut()).expect("run");
    executor
        .execute(
            "INSERT INTO \"user\" (id, name, email) VALUES ('g1', 'Grace', 'grace@example.com')",
            &[],
        )
        .expect("user without password");
}

#[test]
fn revert_restores_earlier_shapes_and_reapplies() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    let migrator = migrator();
    migrator.run_pending(executor.as_mut()).expect("run");

    let report = migrator.revert(executor.as_mut(), 8).expect("revert");
    assert_eq!(report.reverted.len(), 8);
    assert_eq!(report.reverted[0].version, MigrationVersion::new(19));
    assert_eq!(report.reverted[7].version, MigrationVersion::new(12));
    assert_eq!(report.previous_version, 19);
    assert_eq!(report.current_version, 11);

    let user_columns = columns(executor.as_mut(), "user");
    assert!(user_columns.contains(&"tos_and_privacy_accepted_date".to_string()));
    assert!(!columns(executor.as_mut(), "term").contains(&"context".to_string()));
    assert_eq!(object_count(executor.as_mut(), "label"), 0);
    assert_eq!(object_count(executor.as_mut(), "invite"), 0);

    let reapplied = migrator.run_pending(executor.as_mut()).expect("reapply");
    assert_eq!(reapplied.applied.len(), 8);
    assert_eq!(reapplied.current_version, 19);
    assert!(columns(executor.as_mut(), "term").contains(&"context".to_string()));
}

#[test]
fn emulated_foreign_keys_enforce_actions() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    migrator().run_pending(executor.as_mut()).expect("run");

    executor
        .execute(
            "INSERT INTO project (id, name, plan_code) VALUES ('p1', 'Docs', 'open-source')",
            &[],
        )
        .unwrap();
    executor.execute("INSERT INTO term (id, value, project_id) VALUES ('t1', 'hello', 'p1')", &[]).unwrap();

    let orphan =
        executor.execute("INSERT INTO term (id, value, project_id) VALUES ('t2', 'x', 'missing')", &[]);
    assert!(orphan.unwrap_err().to_string().contains("foreign key violation"));
    let bad_plan = executor
        .execute("INSERT INTO project (id, name, plan_code) VALUES ('p2', 'Bad', 'gold')", &[]);
    assert!(bad_plan.is_err());

    executor.execute("DELETE FROM plan WHERE code = 'open-source'", &[]).unwrap();
    let plan = executor.query("SELECT plan_code FROM project WHERE id = 'p1'", &[]).unwrap();
    assert_eq!(plan, vec![vec![SqlValue::Null]]);

    executor.execute("DELETE FROM project WHERE id = 'p1'", &[]).unwrap();
    assert_eq!(count(executor.as_mut(), "SELECT COUNT(*) FROM term"), 0);
}

#[test]
fn failing_unit_rolls_back_and_stays_pending() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    let mut units = standard_units();
    units.truncate(1);
    units.push(Arc::new(BrokenUnit));
    let migrator =
        Migrator::new(MigrationCatalog::new(units).expect("catalog"), Arc::new(SqliteDialect));

    let err = migrator.run_pending(executor.as_mut()).unwrap_err();
    let MigrationError::UnitFailed {
        version,
        label,
        ..
    } = err
    else {
        panic!("expected unit failure, got {err:?}");
    };
    assert_eq!(version, MigrationVersion::new(2));
    assert_eq!(label, "broken");
    assert_eq!(object_count(executor.as_mut(), "scratch"), 0);
    assert_eq!(count(executor.as_mut(), "SELECT COUNT(*) FROM migration_ledger"), 1);

    let status = migrator.status(executor.as_mut()).expect("status");
    assert_eq!(status[0].state, UnitState::Applied);
    assert_eq!(status[1].state, UnitState::Pending);
}

#[test]
fn failed_rebuild_leaves_original_table_in_place() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    migrator().run_pending(executor.as_mut()).expect("run");
    insert_user(executor.as_mut(), "u1", "ada@example.com");
    executor
        .execute("INSERT INTO project (id, name, plan_code) VALUES ('p1', 'Docs', 'default')", &[])
        .unwrap();
    executor
        .execute(
            "INSERT INTO project_user (id, project_id, user_id, role) VALUES ('m1', 'p1', 'u1', 'admin')",
            &[],
        )
        .unwrap();
    let user_columns = columns(executor.as_mut(), "user");
    let user_triggers = triggers_on(executor.as_mut(), "user");
    assert!(!user_triggers.is_empty());
    let users_sql = "SELECT id, name, email, encrypted_password FROM \"user\"";
    let users = executor.query(users_sql, &[]).unwrap();

    let mut units = standard_units();
    units.push(Arc::new(UnfillableColumnRebuild));
    let migrator =
        Migrator::new(MigrationCatalog::new(units).expect("catalog"), Arc::new(SqliteDialect));
    let err = migrator.run_pending(executor.as_mut()).unwrap_err();
    let MigrationError::UnitFailed {
        version,
        ..
    } = err
    else {
        panic!("expected unit failure, got {err:?}");
    };
    assert_eq!(version, MigrationVersion::new(20));

    assert_eq!(columns(executor.as_mut(), "user"), user_columns);
    assert_eq!(executor.query(users_sql, &[]).unwrap(), users);
    assert_eq!(triggers_on(executor.as_mut(), "user"), user_triggers);
    assert_eq!(object_count(executor.as_mut(), "user_shadow"), 0);
    assert_eq!(count(executor.as_mut(), "SELECT COUNT(*) FROM migration_ledger"), 19);
    assert_eq!(count(executor.as_mut(), "PRAGMA legacy_alter_table"), 0);
    assert_eq!(count(executor.as_mut(), "PRAGMA foreign_keys"), 1);

    let status = migrator.status(executor.as_mut()).expect("status");
    assert_eq!(status[18].state, UnitState::Applied);
    assert_eq!(status[19].state, UnitState::Pending);

    // The restored triggers still cascade.
    executor.execute("DELETE FROM \"user\" WHERE id = 'u1'", &[]).unwrap();
    assert_eq!(count(executor.as_mut(), "SELECT COUNT(*) FROM project_user"), 0);
}

#[test]
fn stepwise_revert_matches_fresh_prefix_schemas() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    let migrator = migrator();
    migrator.run_pending(executor.as_mut()).expect("run");
    insert_user(executor.as_mut(), "u1", "ada@example.com");
    executor
        .execute("INSERT INTO project (id, name, plan_code) VALUES ('p1', 'Docs', 'default')", &[])
        .unwrap();
    executor
        .execute(
            "INSERT INTO project_user (id, project_id, user_id, role) VALUES ('m1', 'p1', 'u1', 'admin')",
            &[],
        )
        .unwrap();
    executor.execute("INSERT INTO term (id, value, project_id) VALUES ('t1', 'hello', 'p1')", &[]).unwrap();

    for version in (1..19).rev() {
        let report = migrator.revert(executor.as_mut(), 1).expect("revert one unit");
        assert_eq!(report.current_version, version);
        // Unit 006 is irreversible, so the value column keeps its new type
        // until unit 005 rebuilds the table.
        if version == 5 {
            continue;
        }
        let fresh_dir = TempDir::new().expect("tempdir");
        let mut fresh = self::executor(&fresh_dir);
        prefix(usize::try_from(version).unwrap()).run_pending(fresh.as_mut()).expect("prefix");
        assert_eq!(schema(executor.as_mut()), schema(fresh.as_mut()), "schema at version {version}");
    }
    assert_eq!(count(executor.as_mut(), "SELECT COUNT(*) FROM migration_ledger"), 1);
    assert_eq!(object_count(executor.as_mut(), "user"), 0);
}

#[test]
fn reverted_tos_columns_keep_their_position() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    prefix(12).run_pending(executor.as_mut()).expect("first twelve");
    insert_user(executor.as_mut(), "u1", "ada@example.com");
    prefix(12).revert(executor.as_mut(), 1).expect("revert unit 012");

    let fresh_dir = TempDir::new().expect("tempdir");
    let mut fresh = self::executor(&fresh_dir);
    prefix(11).run_pending(fresh.as_mut()).expect("first eleven");
    let user_columns = columns(executor.as_mut(), "user");
    assert_eq!(user_columns, columns(fresh.as_mut(), "user"));
    assert_eq!(user_columns.last().map(String::as_str), Some("num_projects_created"));
    let users = executor.query("SELECT id, email FROM \"user\"", &[]).unwrap();
    assert_eq!(users, vec![vec![SqlValue::from("u1"), SqlValue::from("ada@example.com")]]);
}

#[test]
fn ledger_gaps_and_unknown_versions_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    let migrator = migrator();
    migrator.run_pending(executor.as_mut()).expect("run");

    executor.execute("DELETE FROM migration_ledger WHERE version = 5", &[]).unwrap();
    let gap = migrator.run_pending(executor.as_mut()).unwrap_err();
    assert!(matches!(gap, MigrationError::LedgerMismatch(_)));

    executor
        .execute(
            "INSERT INTO migration_ledger (version, label, applied_at_ms) VALUES (5, 'fix-translations-primary-key', 0)",
            &[],
        )
        .unwrap();
    executor
        .execute(
            "INSERT INTO migration_ledger (version, label, applied_at_ms) VALUES (99, 'future', 0)",
            &[],
        )
        .unwrap();
    let unknown = migrator.run_pending(executor.as_mut()).unwrap_err();
    assert!(unknown.to_string().contains("unknown version 99"));
}

#[test]
fn status_reports_state_and_reversibility() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);

    let fresh = migrator().status(executor.as_mut()).expect("status");
    assert_eq!(fresh.len(), 19);
    assert!(fresh.iter().all(|unit| unit.state == UnitState::Pending && unit.applied_at_ms.is_none()));
    assert_eq!(fresh[5].reversibility, Reversibility::Irreversible);
    assert_eq!(fresh[12].reversibility, Reversibility::Irreversible);
    assert_eq!(fresh[0].reversibility, Reversibility::Reversible);

    prefix(3).run_pending(executor.as_mut()).expect("first three");
    let partial = migrator().status(executor.as_mut()).expect("status");
    assert!(partial[..3].iter().all(|unit| unit.state == UnitState::Applied));
    assert!(partial[..3].iter().all(|unit| unit.applied_at_ms.is_some()));
    assert_eq!(partial[3].state, UnitState::Pending);
}

#[test]
fn executor_of_another_dialect_is_refused() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    let migrator = Migrator::standard(Arc::new(PostgresDialect)).expect("catalog");
    let err = migrator.run_pending(executor.as_mut()).unwrap_err();
    assert_eq!(err, MigrationError::DialectMismatch {
        strategy: Dialect::Postgres,
        executor: Dialect::Sqlite,
    });
}

#[test]
fn shadow_rebuild_maps_columns_and_restores_indexes() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    executor.execute("CREATE TABLE widget (id varchar(36) PRIMARY KEY, label varchar(255))", &[]).unwrap();
    executor.execute("CREATE INDEX widget_id_idx ON widget (id)", &[]).unwrap();
    executor.execute("INSERT INTO widget (id, label) VALUES ('w1', 'first'), ('w2', 'second')", &[]).unwrap();

    let strategy = SqliteDialect;
    let target = TableBuilder::new(&strategy, "widget")
        .column("id", ColumnKind::Identifier)
        .column("title", ColumnKind::ShortText {
            length: 255,
        })
        .primary_key(&["id"])
        .build();
    let mut ctx = MigrationContext::new(executor.as_mut(), &strategy);
    let summary = ShadowRebuild::new(target)
        .mapping(ColumnMapping::new().with_source("title", "upper(\"label\")"))
        .run(&mut ctx)
        .expect("rebuild");
    assert_eq!(summary.copied_rows, 2);
    assert_eq!(summary.copied_columns, vec!["id".to_string(), "title".to_string()]);
    assert_eq!(summary.restored_objects, vec!["widget_id_idx".to_string()]);

    let rows = executor.query("SELECT id, title FROM widget ORDER BY id", &[]).unwrap();
    assert_eq!(rows, vec![
        vec![SqlValue::from("w1"), SqlValue::from("FIRST")],
        vec![SqlValue::from("w2"), SqlValue::from("SECOND")],
    ]);
    assert_eq!(object_count(executor.as_mut(), "widget_shadow"), 0);
}

#[test]
fn shadow_rebuild_refuses_other_dialects() {
    let dir = TempDir::new().expect("tempdir");
    let mut executor = executor(&dir);
    let strategy = PostgresDialect;
    assert_eq!(strategy.dialect(), Dialect::Postgres);
    let target = TableBuilder::new(&strategy, "widget").column("id", ColumnKind::Identifier).build();
    let mut ctx = MigrationContext::new(executor.as_mut(), &strategy);
    let err = ShadowRebuild::new(target).run(&mut ctx).unwrap_err();
    assert!(matches!(err, StepError::Schema(_)));
}
