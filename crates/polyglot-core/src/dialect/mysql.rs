// polyglot-core/src/dialect/mysql.rs
// ============================================================================
// Module: MySQL Dialect
// Description: Strategy for MySQL-like engines.
// Purpose: Render MySQL DDL, camelCase column names, and charset options.
// ============================================================================

//! ## Overview
//! MySQL renders enums inline, needs a fixed length on binary secrets, and
//! converts table collations when the schema history asks for it. Migration
//! runs hold the `GET_LOCK` named lock.

use crate::core::columns::ColumnDefault;
use crate::core::columns::ColumnSpec;
use crate::core::schema::ColumnDef;
use crate::core::schema::ForeignKeyDef;
use crate::core::schema::MysqlCollation;
use crate::core::schema::TableDef;
use crate::dialect::DdlError;
use crate::dialect::Dialect;
use crate::dialect::DialectStrategy;
use crate::dialect::MigrationLockSql;
use crate::dialect::PhysicalTypes;

/// Named lock guarding migration runs.
const MIGRATION_LOCK_NAME: &str = "polyglot_migrations";
/// Seconds `GET_LOCK` waits before giving up.
const MIGRATION_LOCK_TIMEOUT_SECS: u32 = 60;
/// Encoded width of bcrypt hashes and sealed secrets.
const SECRET_BINARY_LENGTH: u32 = 60;

/// MySQL physical types.
static MYSQL_TYPES: PhysicalTypes = PhysicalTypes {
    binary: "binary",
    token_binary: "blob",
    integer: "int",
    big_integer: "bigint",
    string: "varchar",
    long_text: "text",
    timestamp: "timestamp",
    identifier: "varchar",
    identifier_length: Some(255),
};

/// MySQL strategy.
///
/// Column names are stored in lowerCamelCase; table and index names are not
/// rewritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl DialectStrategy for MysqlDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn physical_types(&self) -> &'static PhysicalTypes {
        &MYSQL_TYPES
    }

    fn supports_inline_enum(&self) -> bool {
        true
    }

    fn fixed_binary_length(&self) -> Option<u32> {
        Some(SECRET_BINARY_LENGTH)
    }

    fn supports_fractional_seconds(&self) -> bool {
        true
    }

    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn emulates_foreign_keys(&self) -> bool {
        false
    }

    fn generates_identifiers(&self) -> bool {
        false
    }

    fn column_name(&self, logical: &str) -> String {
        camel_case(logical)
    }

    fn render_default(&self, default: &ColumnDefault, spec: &ColumnSpec) -> Option<String> {
        match default {
            ColumnDefault::Integer(value) => Some(value.to_string()),
            ColumnDefault::Text(value) => Some(self.literal(value)),
            ColumnDefault::CurrentTimestamp => Some(spec.precision.map_or_else(
                || "CURRENT_TIMESTAMP".to_string(),
                |precision| format!("CURRENT_TIMESTAMP({precision})"),
            )),
            ColumnDefault::GeneratedIdentifier => None,
        }
    }

    fn table_options(&self, table: &TableDef) -> String {
        table.collation.map_or_else(
            || " ENGINE=InnoDB".to_string(),
            |collation| {
                format!(" ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE={}", collation.as_str())
            },
        )
    }

    fn convert_table_collation(&self, table: &str, collation: MysqlCollation) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} CONVERT TO CHARACTER SET utf8mb4 COLLATE {}",
            self.quote_identifier(table),
            collation.as_str()
        ))
    }

    fn foreign_key_checks(&self, enabled: bool) -> Option<String> {
        Some(format!("SET FOREIGN_KEY_CHECKS={}", u8::from(enabled)))
    }

    fn alter_column(&self, table: &str, column: &ColumnDef) -> Result<Vec<String>, DdlError> {
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.quote_identifier(table),
            self.render_column(column)
        )])
    }

    fn drop_foreign_key(&self, foreign_key: &ForeignKeyDef) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(&foreign_key.table),
            self.quote_identifier(&foreign_key.name)
        )]
    }

    fn drop_index(&self, name: &str, table: &str) -> String {
        format!("DROP INDEX {} ON {}", self.quote_identifier(name), self.quote_identifier(table))
    }

    fn drop_primary_key(&self, table: &str) -> Result<String, DdlError> {
        Ok(format!("ALTER TABLE {} DROP PRIMARY KEY", self.quote_identifier(table)))
    }

    fn table_exists_sql(&self) -> String {
        "SELECT 1 FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name \
         = ?"
            .to_string()
    }

    fn column_names_sql(&self) -> String {
        "SELECT column_name FROM information_schema.columns WHERE table_schema = DATABASE() AND \
         table_name = ? ORDER BY ordinal_position"
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
            acquire: format!(
                "SELECT GET_LOCK('{MIGRATION_LOCK_NAME}', {MIGRATION_LOCK_TIMEOUT_SECS})"
            ),
            release: format!("SELECT RELEASE_LOCK('{MIGRATION_LOCK_NAME}')"),
            confirms: true,
        })
    }
}

/// Converts `snake_case` to `lowerCamelCase`.
fn camel_case(logical: &str) -> String {
    let mut out = String::with_capacity(logical.len());
    let mut upper_next = false;
    for ch in logical.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::camel_case;

    #[test]
    fn camel_case_maps_snake_case_columns() {
        assert_eq!(camel_case("project_locale_id"), "projectLocaleId");
        assert_eq!(camel_case("id"), "id");
        assert_eq!(camel_case("tos_and_privacy_accepted_date"), "tosAndPrivacyAcceptedDate");
    }
}
