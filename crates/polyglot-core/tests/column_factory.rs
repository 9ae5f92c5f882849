// polyglot-core/tests/column_factory.rs
// ============================================================================
// Module: Column-Type Factory Tests
// Description: Physical column mapping per dialect and determinism properties.
// Purpose: Ensure logical kinds map to the column shapes migrations produce.
// Dependencies: polyglot-core, proptest
// ============================================================================

//! ## Overview
//! Checks the per-dialect physical mapping of every factory kind, the
//! application of options and overrides, and the determinism guarantee.

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

use polyglot_core::CheckConstraint;
use polyglot_core::ColumnDef;
use polyglot_core::ColumnDefault;
use polyglot_core::ColumnKind;
use polyglot_core::ColumnOptions;
use polyglot_core::Dialect;
use polyglot_core::DialectOverrides;
use polyglot_core::strategy_for;
use proptest::prelude::*;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn spec_for(dialect: Dialect, kind: ColumnKind) -> polyglot_core::ColumnSpec {
    strategy_for(dialect).spec(kind)
}

fn factory_kinds() -> impl Strategy<Value = ColumnKind> {
    prop::sample::select(ColumnKind::FACTORY_KINDS.to_vec())
}

fn dialects() -> impl Strategy<Value = Dialect> {
    prop::sample::select(Dialect::ALL.to_vec())
}

// ============================================================================
// SECTION: Mapping Tests
// ============================================================================

#[test]
fn role_column_is_inline_enum_only_on_mysql() {
    let mysql = spec_for(Dialect::Mysql, ColumnKind::EnumeratedRole);
    assert_eq!(mysql.type_name, "enum");
    assert_eq!(
        mysql.enum_values,
        Some(vec!["admin".to_string(), "editor".to_string(), "viewer".to_string()])
    );
    assert_eq!(mysql.default, Some(ColumnDefault::Text("viewer".to_string())));
    assert!(mysql.check.is_none());

    for dialect in [Dialect::Postgres, Dialect::Sqlite] {
        let spec = spec_for(dialect, ColumnKind::EnumeratedRole);
        assert_eq!(spec.type_name, "varchar");
        assert_eq!(spec.length, Some(20));
        assert!(spec.enum_values.is_none());
        assert_eq!(spec.default, Some(ColumnDefault::Text("viewer".to_string())));
        assert!(matches!(spec.check, Some(CheckConstraint::OneOf(ref values)) if values.len() == 3));
        assert!(!spec.nullable);
    }
}

#[test]
fn status_column_defaults_to_sent() {
    for dialect in Dialect::ALL {
        let spec = spec_for(dialect, ColumnKind::EnumeratedStatus);
        assert_eq!(spec.default, Some(ColumnDefault::Text("sent".to_string())));
    }
    let sqlite = spec_for(Dialect::Sqlite, ColumnKind::EnumeratedStatus);
    assert_eq!(
        sqlite.check,
        Some(CheckConstraint::OneOf(vec!["sent".to_string(), "accepted".to_string()]))
    );
}

#[test]
fn secret_binary_has_fixed_width_only_on_mysql() {
    let postgres = spec_for(Dialect::Postgres, ColumnKind::BinarySecret);
    let mysql = spec_for(Dialect::Mysql, ColumnKind::BinarySecret);
    let sqlite = spec_for(Dialect::Sqlite, ColumnKind::BinarySecret);
    assert_eq!((postgres.type_name.as_str(), postgres.length), ("bytea", None));
    assert_eq!((mysql.type_name.as_str(), mysql.length), ("binary", Some(60)));
    assert_eq!((sqlite.type_name.as_str(), sqlite.length), ("blob", None));
    assert!(postgres.nullable && mysql.nullable && sqlite.nullable);

    let token = spec_for(Dialect::Mysql, ColumnKind::BinaryToken);
    assert_eq!(token.length, None);
    assert!(token.nullable);
}

#[test]
fn timestamp_precision_is_omitted_on_sqlite() {
    for dialect in [Dialect::Postgres, Dialect::Mysql] {
        let precise = spec_for(dialect, ColumnKind::TimestampWithPrecision);
        assert_eq!(precise.type_name, "timestamp");
        assert_eq!(precise.precision, Some(6));
        assert_eq!(spec_for(dialect, ColumnKind::Timestamp).precision, None);
    }
    let sqlite = spec_for(Dialect::Sqlite, ColumnKind::TimestampWithPrecision);
    assert_eq!(sqlite.type_name, "datetime");
    assert_eq!(sqlite.precision, None);

    let options = ColumnOptions {
        precision: Some(3),
        ..ColumnOptions::default()
    };
    let forced = strategy_for(Dialect::Sqlite).column_for(
        &ColumnKind::Timestamp,
        &DialectOverrides::default(),
        &options,
    );
    assert_eq!(forced.precision, None);
}

#[test]
fn counter_defaults_to_zero_and_is_not_null() {
    let expected = [(Dialect::Postgres, "integer"), (Dialect::Mysql, "int"), (Dialect::Sqlite, "integer")];
    for (dialect, type_name) in expected {
        let spec = spec_for(dialect, ColumnKind::Counter);
        assert_eq!(spec.type_name, type_name);
        assert_eq!(spec.default, Some(ColumnDefault::Integer(0)));
        assert!(!spec.nullable);
    }
}

#[test]
fn overrides_apply_only_to_their_dialect() {
    let overrides = DialectOverrides {
        mysql: Some("varbinary".to_string()),
        ..DialectOverrides::default()
    };
    let options = ColumnOptions::not_null();
    let mysql = strategy_for(Dialect::Mysql).column_for(&ColumnKind::BinarySecret, &overrides, &options);
    let postgres =
        strategy_for(Dialect::Postgres).column_for(&ColumnKind::BinarySecret, &overrides, &options);
    assert_eq!(mysql.type_name, "varbinary");
    assert!(!mysql.nullable);
    assert_eq!(postgres.type_name, "bytea");
}

#[test]
fn rendered_role_column_matches_dialect_syntax() {
    let column = |dialect: Dialect| ColumnDef {
        name: "role".to_string(),
        spec: spec_for(dialect, ColumnKind::EnumeratedRole),
    };
    assert_eq!(
        strategy_for(Dialect::Sqlite).render_column(&column(Dialect::Sqlite)),
        "\"role\" varchar(20) NOT NULL DEFAULT 'viewer' CHECK (\"role\" IN ('admin', 'editor', \
         'viewer'))"
    );
    assert_eq!(
        strategy_for(Dialect::Mysql).render_column(&column(Dialect::Mysql)),
        "`role` enum('admin', 'editor', 'viewer') NOT NULL DEFAULT 'viewer'"
    );
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn column_for_is_deterministic(
        kind in factory_kinds(),
        dialect in dialects(),
        nullable in proptest::option::of(any::<bool>()),
        length in proptest::option::of(1_u32..512),
    ) {
        let options = ColumnOptions {
            nullable,
            length,
            ..ColumnOptions::default()
        };
        let first = strategy_for(dialect).column_for(&kind, &DialectOverrides::default(), &options);
        let second = strategy_for(dialect).column_for(&kind, &DialectOverrides::default(), &options);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn sqlite_specs_never_carry_native_enums(
        kind in factory_kinds(),
        default in proptest::option::of("[a-z]{1,8}"),
    ) {
        let options = ColumnOptions {
            default: default.map(ColumnDefault::Text),
            ..ColumnOptions::default()
        };
        let spec = strategy_for(Dialect::Sqlite).column_for(&kind, &DialectOverrides::default(), &options);
        prop_assert!(spec.enum_values.is_none());
        prop_assert_ne!(spec.type_name.as_str(), "enum");
        prop_assert!(spec.precision.is_none());
    }
}
