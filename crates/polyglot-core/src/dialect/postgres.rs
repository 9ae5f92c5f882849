// polyglot-core/src/dialect/postgres.rs
// ============================================================================
// Module: Postgres Dialect
// Description: Strategy for Postgres-like engines.
// Purpose: Render Postgres DDL and expose its capabilities.
// ============================================================================

//! ## Overview
//! Postgres alters columns in place, stores enumerated columns as named
//! enum types, and enforces foreign keys natively. Identifiers are `uuid`
//! generated by `uuid_generate_v4()`. Migration runs are serialized with a
//! session advisory lock.

use crate::core::columns::ColumnDefault;
use crate::core::columns::ColumnSpec;
use crate::core::schema::ColumnDef;
use crate::core::schema::ForeignKeyDef;
use crate::dialect::DdlError;
use crate::dialect::Dialect;
use crate::dialect::DialectStrategy;
use crate::dialect::MigrationLockSql;
use crate::dialect::PhysicalTypes;

/// Advisory lock key guarding migration runs ("poly").
const MIGRATION_LOCK_KEY: i64 = 0x706f_6c79;

/// Postgres physical types.
static POSTGRES_TYPES: PhysicalTypes = PhysicalTypes {
    binary: "bytea",
    token_binary: "bytea",
    integer: "integer",
    big_integer: "bigint",
    string: "varchar",
    long_text: "text",
    timestamp: "timestamp",
    identifier: "uuid",
    identifier_length: None,
};

/// Postgres strategy.
///
/// Postgres enums exist only as separately declared named types, so enumerated
/// columns are check-constrained strings here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl DialectStrategy for PostgresDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn physical_types(&self) -> &'static PhysicalTypes {
        &POSTGRES_TYPES
    }

    fn supports_inline_enum(&self) -> bool {
        false
    }

    fn fixed_binary_length(&self) -> Option<u32> {
        None
    }

    fn supports_fractional_seconds(&self) -> bool {
        true
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn emulates_foreign_keys(&self) -> bool {
        false
    }

    fn generates_identifiers(&self) -> bool {
        true
    }

    fn render_default(&self, default: &ColumnDefault, spec: &ColumnSpec) -> Option<String> {
        match default {
            ColumnDefault::Integer(value) => Some(value.to_string()),
            ColumnDefault::Text(value) => Some(self.literal(value)),
            ColumnDefault::CurrentTimestamp => Some(spec.precision.map_or_else(
                || "CURRENT_TIMESTAMP".to_string(),
                |precision| format!("CURRENT_TIMESTAMP({precision})"),
            )),
            ColumnDefault::GeneratedIdentifier => Some("uuid_generate_v4()".to_string()),
        }
    }

    fn alter_column(&self, table: &str, column: &ColumnDef) -> Result<Vec<String>, DdlError> {
        let table = self.quote_identifier(table);
        let name = self.quote_column(&column.name);
        let physical = self.render_type(&column.spec);
        let mut statements = vec![format!(
            "ALTER TABLE {table} ALTER COLUMN {name} TYPE {physical} USING {name}::{physical}"
        )];
        let nullability = if column.spec.nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
        statements.push(format!("ALTER TABLE {table} ALTER COLUMN {name} {nullability}"));
        let default = column
            .spec
            .default
            .as_ref()
            .and_then(|default| self.render_default(default, &column.spec));
        statements.push(match default {
            Some(default) => format!("ALTER TABLE {table} ALTER COLUMN {name} SET DEFAULT {default}"),
            None => format!("ALTER TABLE {table} ALTER COLUMN {name} DROP DEFAULT"),
        });
        Ok(statements)
    }

    fn drop_foreign_key(&self, foreign_key: &ForeignKeyDef) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}",
            self.quote_identifier(&foreign_key.table),
            self.quote_identifier(&foreign_key.name)
        )]
    }

    fn drop_index(&self, name: &str, _table: &str) -> String {
        format!("DROP INDEX IF EXISTS {}", self.quote_identifier(name))
    }

    fn drop_primary_key(&self, table: &str) -> Result<String, DdlError> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table),
            self.quote_identifier(&format!("{table}_pkey"))
        ))
    }

    fn table_exists_sql(&self) -> String {
        "SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND \
         table_name = $1"
            .to_string()
    }

    fn column_names_sql(&self) -> String {
        "SELECT column_name::text FROM information_schema.columns WHERE table_schema = \
         current_schema() AND table_name = $1 ORDER BY ordinal_position"
            .to_string()
    }

    fn row_lock_suffix(&self) -> &'static str {
        " FOR UPDATE"
    }

    fn greatest_function(&self) -> &'static str {
        "GREATEST"
    }

    fn migration_lock(&self) -> Option<MigrationLockSql> {
        Some(MigrationLockSql {
            acquire: format!("SELECT pg_advisory_lock({MIGRATION_LOCK_KEY})::text"),
            release: format!("SELECT pg_advisory_unlock({MIGRATION_LOCK_KEY})::text"),
            confirms: false,
        })
    }
}
