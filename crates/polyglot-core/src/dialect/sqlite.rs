// polyglot-core/src/dialect/sqlite.rs
// ============================================================================
// Module: SQLite Dialect
// Description: Strategy for the embedded SQLite-like engine.
// Purpose: Render SQLite DDL and emulate foreign keys with triggers.
// ============================================================================

//! ## Overview
//! `SQLite` has no enum type, cannot drop or retype columns, and cannot add a
//! foreign key to an existing table. Column changes of that kind return
//! [`DdlError::Unsupported`] so callers fall back to the table rebuild.
//! Foreign keys are rendered as three triggers per key: insert and update
//! checks on the child, and the referential action on the parent.

use crate::core::columns::ColumnDefault;
use crate::core::columns::ColumnSpec;
use crate::core::schema::ColumnDef;
use crate::core::schema::ForeignKeyDef;
use crate::core::schema::ReferentialAction;
use crate::dialect::DdlError;
use crate::dialect::Dialect;
use crate::dialect::DialectStrategy;
use crate::dialect::MigrationLockSql;
use crate::dialect::PhysicalTypes;

/// `SQLite` physical types.
static SQLITE_TYPES: PhysicalTypes = PhysicalTypes {
    binary: "blob",
    token_binary: "blob",
    integer: "integer",
    big_integer: "integer",
    string: "varchar",
    long_text: "text",
    timestamp: "datetime",
    identifier: "varchar",
    identifier_length: Some(36),
};

/// `SQLite` strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Builds the unsupported-operation error.
    const fn unsupported(operation: &'static str) -> DdlError {
        DdlError::Unsupported {
            dialect: Dialect::Sqlite,
            operation,
        }
    }

    /// Renders `a = b AND ...` pairing child columns with `row` parent values.
    fn match_clause(&self, left: &[String], row: &str, right: &[String]) -> String {
        left.iter()
            .zip(right)
            .map(|(l, r)| format!("{} = {row}.{}", self.quote_identifier(l), self.quote_identifier(r)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Renders the child-side existence check trigger for `event`.
    fn child_check_trigger(&self, foreign_key: &ForeignKeyDef, event: &str) -> String {
        let suffix = event.to_ascii_lowercase();
        let present = foreign_key
            .columns
            .iter()
            .map(|column| format!("NEW.{} IS NOT NULL", self.quote_identifier(column)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let target = if event == "UPDATE" {
            format!("UPDATE OF {}", self.column_list(&foreign_key.columns))
        } else {
            event.to_string()
        };
        format!(
            "CREATE TRIGGER IF NOT EXISTS {} BEFORE {target} ON {} FOR EACH ROW WHEN {present} \
             BEGIN SELECT RAISE(ABORT, {}) WHERE NOT EXISTS (SELECT 1 FROM {} WHERE {}); END",
            self.quote_identifier(&format!("{}_{suffix}", foreign_key.trigger_stem())),
            self.quote_identifier(&foreign_key.table),
            self.literal(&format!(
                "foreign key violation: {}.{} must reference {}",
                foreign_key.table,
                foreign_key.columns.join(","),
                foreign_key.parent_table
            )),
            self.quote_identifier(&foreign_key.parent_table),
            self.match_clause(&foreign_key.parent_columns, "NEW", &foreign_key.columns)
        )
    }

    /// Renders the parent-side delete trigger carrying the referential action.
    fn parent_delete_trigger(&self, foreign_key: &ForeignKeyDef) -> String {
        let child = self.quote_identifier(&foreign_key.table);
        let matches = self.match_clause(&foreign_key.columns, "OLD", &foreign_key.parent_columns);
        let body = match foreign_key.on_delete {
            ReferentialAction::Cascade => format!("DELETE FROM {child} WHERE {matches};"),
            ReferentialAction::SetNull => {
                let nulls = foreign_key
                    .columns
                    .iter()
                    .map(|column| format!("{} = NULL", self.quote_identifier(column)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("UPDATE {child} SET {nulls} WHERE {matches};")
            }
            ReferentialAction::Restrict => format!(
                "SELECT RAISE(ABORT, {}) WHERE EXISTS (SELECT 1 FROM {child} WHERE {matches});",
                self.literal(&format!(
                    "foreign key violation: {} still referenced by {}",
                    foreign_key.parent_table, foreign_key.table
                ))
            ),
        };
        format!(
            "CREATE TRIGGER IF NOT EXISTS {} BEFORE DELETE ON {} FOR EACH ROW BEGIN {body} END",
            self.quote_identifier(&format!("{}_delete", foreign_key.trigger_stem())),
            self.quote_identifier(&foreign_key.parent_table)
        )
    }
}

impl DialectStrategy for SqliteDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn physical_types(&self) -> &'static PhysicalTypes {
        &SQLITE_TYPES
    }

    fn supports_inline_enum(&self) -> bool {
        false
    }

    fn fixed_binary_length(&self) -> Option<u32> {
        None
    }

    fn supports_fractional_seconds(&self) -> bool {
        false
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn emulates_foreign_keys(&self) -> bool {
        true
    }

    fn generates_identifiers(&self) -> bool {
        true
    }

    fn render_default(&self, default: &ColumnDefault, _spec: &ColumnSpec) -> Option<String> {
        match default {
            ColumnDefault::Integer(value) => Some(value.to_string()),
            ColumnDefault::Text(value) => Some(self.literal(value)),
            ColumnDefault::CurrentTimestamp => Some("(datetime('now'))".to_string()),
            ColumnDefault::GeneratedIdentifier => Some("(lower(hex(randomblob(16))))".to_string()),
        }
    }

    fn alter_column(&self, _table: &str, _column: &ColumnDef) -> Result<Vec<String>, DdlError> {
        Err(Self::unsupported("alter a column"))
    }

    fn drop_column(&self, _table: &str, _column: &str) -> Result<String, DdlError> {
        Err(Self::unsupported("drop a column"))
    }

    fn add_primary_key(&self, _table: &str, _columns: &[String]) -> Result<String, DdlError> {
        Err(Self::unsupported("add a primary key"))
    }

    fn drop_primary_key(&self, _table: &str) -> Result<String, DdlError> {
        Err(Self::unsupported("drop a primary key"))
    }

    fn add_foreign_key(&self, foreign_key: &ForeignKeyDef) -> Vec<String> {
        vec![
            self.child_check_trigger(foreign_key, "INSERT"),
            self.child_check_trigger(foreign_key, "UPDATE"),
            self.parent_delete_trigger(foreign_key),
        ]
    }

    fn drop_foreign_key(&self, foreign_key: &ForeignKeyDef) -> Vec<String> {
        ["insert", "update", "delete"]
            .iter()
            .map(|suffix| {
                format!(
                    "DROP TRIGGER IF EXISTS {}",
                    self.quote_identifier(&format!("{}_{suffix}", foreign_key.trigger_stem()))
                )
            })
            .collect()
    }

    fn drop_index(&self, name: &str, _table: &str) -> String {
        format!("DROP INDEX IF EXISTS {}", self.quote_identifier(name))
    }

    fn table_exists_sql(&self) -> String {
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1".to_string()
    }

    fn column_names_sql(&self) -> String {
        "SELECT name FROM pragma_table_info(?1) ORDER BY cid".to_string()
    }

    fn row_lock_suffix(&self) -> &'static str {
        ""
    }

    fn greatest_function(&self) -> &'static str {
        "MAX"
    }

    fn migration_lock(&self) -> Option<MigrationLockSql> {
        None
    }
}
