// polyglot-core/src/dialect/strategy.rs
// ============================================================================
// Module: Dialect Strategy
// Description: The single interface encapsulating every engine-specific rule.
// Purpose: Let migrations, the column factory and authorization stay dialect-agnostic.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! A [`DialectStrategy`] answers capability questions, names physical types,
//! quotes and maps identifiers, and renders DDL from the schema model.
//! Provided methods hold the rendering shared by all engines; each concrete
//! strategy overrides only what its engine does differently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::columns::CheckConstraint;
use crate::core::columns::ColumnDefault;
use crate::core::columns::ColumnKind;
use crate::core::columns::ColumnOptions;
use crate::core::columns::ColumnSpec;
use crate::core::columns::DialectOverrides;
use crate::core::columns::column_for;
use crate::core::schema::ColumnDef;
use crate::core::schema::ForeignKeyDef;
use crate::core::schema::IndexDef;
use crate::core::schema::MysqlCollation;
use crate::core::schema::TableDef;
use crate::dialect::DdlError;
use crate::dialect::Dialect;
use crate::dialect::PhysicalTypes;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Statements guarding a migration run against concurrent runners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationLockSql {
    /// Statement acquiring the lock.
    pub acquire: String,
    /// Statement releasing the lock.
    pub release: String,
    /// Whether `acquire` returns a row whose first column must equal 1.
    pub confirms: bool,
}

// ============================================================================
// SECTION: Strategy
// ============================================================================

/// Engine-specific behavior behind one interface.
pub trait DialectStrategy: Send + Sync {
    /// Returns the dialect implemented.
    fn dialect(&self) -> Dialect;

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String;

    /// Returns the bind placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Returns physical type names for each logical family.
    fn physical_types(&self) -> &'static PhysicalTypes;

    /// Whether enum types can be declared inline on a column.
    fn supports_inline_enum(&self) -> bool;

    /// Fixed width applied to secret binary columns, if the engine needs one.
    fn fixed_binary_length(&self) -> Option<u32>;

    /// Whether timestamp DDL accepts fractional-second precision.
    fn supports_fractional_seconds(&self) -> bool;

    /// Whether DDL statements participate in transactions.
    fn supports_transactional_ddl(&self) -> bool;

    /// Whether foreign keys are emulated with triggers.
    fn emulates_foreign_keys(&self) -> bool;

    /// Whether storage can generate identifier defaults.
    fn generates_identifiers(&self) -> bool;

    /// Renders a default value, or `None` when the engine has no equivalent.
    fn render_default(&self, default: &ColumnDefault, spec: &ColumnSpec) -> Option<String>;

    /// Renders statements changing a column's type, nullability and default.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::Unsupported`] when the engine needs a rebuild.
    fn alter_column(&self, table: &str, column: &ColumnDef) -> Result<Vec<String>, DdlError>;

    /// Renders the removal of a foreign key.
    fn drop_foreign_key(&self, foreign_key: &ForeignKeyDef) -> Vec<String>;

    /// Renders the removal of an index.
    fn drop_index(&self, name: &str, table: &str) -> String;

    /// Renders the removal of a table's primary key.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::Unsupported`] when the engine needs a rebuild.
    fn drop_primary_key(&self, table: &str) -> Result<String, DdlError>;

    /// Query returning one row when the table (parameter 1) exists.
    fn table_exists_sql(&self) -> String;

    /// Query returning the physical column names of a table (parameter 1).
    fn column_names_sql(&self) -> String;

    /// Suffix appended to a single-row select to lock it for the transaction.
    fn row_lock_suffix(&self) -> &'static str;

    /// Two-argument maximum function name.
    fn greatest_function(&self) -> &'static str;

    /// Startup lock statements, if the engine needs them.
    fn migration_lock(&self) -> Option<MigrationLockSql>;

    /// Maps a logical column name to its physical name.
    fn column_name(&self, logical: &str) -> String {
        logical.to_string()
    }

    /// Quotes a logical column name after mapping it.
    fn quote_column(&self, logical: &str) -> String {
        self.quote_identifier(&self.column_name(logical))
    }

    /// Renders a comma-separated list of quoted columns.
    fn column_list(&self, logical: &[String]) -> String {
        logical.iter().map(|name| self.quote_column(name)).collect::<Vec<_>>().join(", ")
    }

    /// Renders a string literal.
    fn literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Runs the column-type factory.
    fn column_for(
        &self,
        kind: &ColumnKind,
        overrides: &DialectOverrides,
        options: &ColumnOptions,
    ) -> ColumnSpec {
        column_for(self, kind, overrides, options)
    }

    /// Runs the column-type factory with no overrides or options.
    fn spec(&self, kind: ColumnKind) -> ColumnSpec {
        self.column_for(&kind, &DialectOverrides::default(), &ColumnOptions::default())
    }

    /// Renders a column's type with its length or precision.
    fn render_type(&self, spec: &ColumnSpec) -> String {
        if let Some(values) = &spec.enum_values {
            let members =
                values.iter().map(|value| self.literal(value)).collect::<Vec<_>>().join(", ");
            return format!("enum({members})");
        }
        match (spec.length, spec.precision) {
            (Some(length), _) => format!("{}({length})", spec.type_name),
            (None, Some(precision)) => format!("{}({precision})", spec.type_name),
            (None, None) => spec.type_name.clone(),
        }
    }

    /// Renders a full column definition.
    fn render_column(&self, column: &ColumnDef) -> String {
        let spec = &column.spec;
        let mut sql = format!("{} {}", self.quote_column(&column.name), self.render_type(spec));
        if !spec.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = spec.default.as_ref().and_then(|d| self.render_default(d, spec)) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        if let Some(CheckConstraint::OneOf(values)) = &spec.check {
            let members =
                values.iter().map(|value| self.literal(value)).collect::<Vec<_>>().join(", ");
            sql.push_str(&format!(" CHECK ({} IN ({members}))", self.quote_column(&column.name)));
        }
        sql
    }

    /// Renders the inline clause for a native foreign key.
    fn foreign_key_clause(&self, foreign_key: &ForeignKeyDef) -> String {
        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            self.quote_identifier(&foreign_key.name),
            self.column_list(&foreign_key.columns),
            self.quote_identifier(&foreign_key.parent_table),
            self.column_list(&foreign_key.parent_columns),
            foreign_key.on_delete.sql_clause()
        )
    }

    /// Renders table options trailing `CREATE TABLE`.
    fn table_options(&self, _table: &TableDef) -> String {
        String::new()
    }

    /// Renders `CREATE TABLE` for `table` under the physical name `name`.
    fn create_table_statement(&self, table: &TableDef, name: &str) -> String {
        let mut parts: Vec<String> =
            table.columns.iter().map(|column| self.render_column(column)).collect();
        if !table.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", self.column_list(&table.primary_key)));
        }
        for unique in &table.uniques {
            parts.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&unique.name),
                self.column_list(&unique.columns)
            ));
        }
        if !self.emulates_foreign_keys() {
            for foreign_key in &table.foreign_keys {
                parts.push(self.foreign_key_clause(foreign_key));
            }
        }
        format!(
            "CREATE TABLE {} ({}){}",
            self.quote_identifier(name),
            parts.join(", "),
            self.table_options(table)
        )
    }

    /// Renders statements creating `table` with its indexes and key emulation.
    fn create_table(&self, table: &TableDef) -> Vec<String> {
        let mut statements = vec![self.create_table_statement(table, &table.name)];
        statements.extend(self.dependent_objects(table));
        statements
    }

    /// Renders the indexes and emulated foreign keys that belong to `table`.
    fn dependent_objects(&self, table: &TableDef) -> Vec<String> {
        let mut statements: Vec<String> =
            table.indexes.iter().map(|index| self.create_index(index)).collect();
        if self.emulates_foreign_keys() {
            for foreign_key in &table.foreign_keys {
                statements.extend(self.add_foreign_key(foreign_key));
            }
        }
        statements
    }

    /// Renders `CREATE INDEX`.
    fn create_index(&self, index: &IndexDef) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_identifier(&index.table),
            self.column_list(&index.columns)
        )
    }

    /// Renders `DROP TABLE IF EXISTS`.
    fn drop_table(&self, name: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(name))
    }

    /// Renders a table rename.
    fn rename_table(&self, from: &str, to: &str) -> String {
        format!("ALTER TABLE {} RENAME TO {}", self.quote_identifier(from), self.quote_identifier(to))
    }

    /// Renders the addition of a column.
    fn add_column(&self, table: &str, column: &ColumnDef) -> String {
        format!("ALTER TABLE {} ADD COLUMN {}", self.quote_identifier(table), self.render_column(column))
    }

    /// Renders the removal of a column.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::Unsupported`] when the engine needs a rebuild.
    fn drop_column(&self, table: &str, column: &str) -> Result<String, DdlError> {
        Ok(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table),
            self.quote_column(column)
        ))
    }

    /// Renders the addition of a primary key.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::Unsupported`] when the engine needs a rebuild.
    fn add_primary_key(&self, table: &str, columns: &[String]) -> Result<String, DdlError> {
        Ok(format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({})",
            self.quote_identifier(table),
            self.column_list(columns)
        ))
    }

    /// Renders the conversion of an existing table to `collation`, if the
    /// engine stores per-table character sets.
    fn convert_table_collation(&self, _table: &str, _collation: MysqlCollation) -> Option<String> {
        None
    }

    /// Renders a session toggle for foreign-key enforcement, if the engine has one.
    fn foreign_key_checks(&self, _enabled: bool) -> Option<String> {
        None
    }

    /// Renders the addition of a foreign key to an existing table.
    fn add_foreign_key(&self, foreign_key: &ForeignKeyDef) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier(&foreign_key.table),
            self.foreign_key_clause(foreign_key)
        )]
    }
}
