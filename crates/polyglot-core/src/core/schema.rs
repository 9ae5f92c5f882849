// polyglot-core/src/core/schema.rs
// ============================================================================
// Module: Schema Model
// Description: Dialect-neutral table, index, and foreign-key definitions.
// Purpose: Describe target table shapes for DDL rendering and rebuilds.
// Dependencies: crate::core::columns, crate::dialect
// ============================================================================

//! ## Overview
//! A [`TableDef`] is the complete post-change shape of one table: columns with
//! their physical specs, primary key, unique constraints, secondary indexes
//! and foreign keys. Strategies render it as `CREATE TABLE` plus follow-up
//! statements; the `SQLite` rebuild uses it as the shadow table's shape.
//! Column names are logical (snake_case); strategies map them to physical
//! names when rendering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::columns::ColumnKind;
use crate::core::columns::ColumnOptions;
use crate::core::columns::ColumnSpec;
use crate::core::columns::DialectOverrides;
use crate::core::columns::column_for;
use crate::dialect::DialectStrategy;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Named column with its physical spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Logical column name.
    pub name: String,
    /// Physical spec.
    pub spec: ColumnSpec,
}

/// Named unique constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueDef {
    /// Constraint name.
    pub name: String,
    /// Logical column names.
    pub columns: Vec<String>,
}

/// Secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Indexed table.
    pub table: String,
    /// Logical column names.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

/// Action taken on child rows when the parent row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    /// Delete child rows.
    Cascade,
    /// Refuse the parent delete while children exist.
    Restrict,
    /// Null out the child reference.
    SetNull,
}

impl ReferentialAction {
    /// Returns the `ON DELETE` clause keyword.
    #[must_use]
    pub const fn sql_clause(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
        }
    }
}

/// Foreign key from a child table to a parent table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// Constraint name on rich dialects.
    pub name: String,
    /// Child table.
    pub table: String,
    /// Child columns.
    pub columns: Vec<String>,
    /// Parent table.
    pub parent_table: String,
    /// Parent columns, positionally matched to `columns`.
    pub parent_columns: Vec<String>,
    /// Delete behavior.
    pub on_delete: ReferentialAction,
}

impl ForeignKeyDef {
    /// Returns the base name used for emulation triggers.
    #[must_use]
    pub fn trigger_stem(&self) -> String {
        format!("fk_{}_{}", self.table, self.columns.join("_"))
    }
}

/// MySQL table collation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MysqlCollation {
    /// Case-insensitive Unicode collation.
    UnicodeCi,
    /// Binary (case-sensitive) collation.
    Bin,
}

impl MysqlCollation {
    /// Returns the collation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnicodeCi => "utf8mb4_unicode_ci",
            Self::Bin => "utf8mb4_bin",
        }
    }
}

/// Complete table shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Columns in physical order.
    pub columns: Vec<ColumnDef>,
    /// Primary key columns.
    pub primary_key: Vec<String>,
    /// Unique constraints declared inline.
    pub uniques: Vec<UniqueDef>,
    /// Secondary indexes created after the table.
    pub indexes: Vec<IndexDef>,
    /// Outgoing foreign keys.
    pub foreign_keys: Vec<ForeignKeyDef>,
    /// Collation applied on MySQL.
    pub collation: Option<MysqlCollation>,
}

impl TableDef {
    /// Returns the column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns the logical column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds a [`TableDef`] using a strategy's column-type factory.
pub struct TableBuilder<'a, S: DialectStrategy + ?Sized> {
    /// Strategy resolving column kinds.
    strategy: &'a S,
    /// Table under construction.
    table: TableDef,
}

impl<'a, S: DialectStrategy + ?Sized> TableBuilder<'a, S> {
    /// Starts a table definition.
    #[must_use]
    pub fn new(strategy: &'a S, name: &str) -> Self {
        Self {
            strategy,
            table: TableDef {
                name: name.to_string(),
                columns: Vec::new(),
                primary_key: Vec::new(),
                uniques: Vec::new(),
                indexes: Vec::new(),
                foreign_keys: Vec::new(),
                collation: None,
            },
        }
    }

    /// Adds a column of `kind` with default options.
    #[must_use]
    pub fn column(self, name: &str, kind: ColumnKind) -> Self {
        self.column_with(name, kind, &ColumnOptions::default())
    }

    /// Adds a column of `kind` with explicit options.
    #[must_use]
    pub fn column_with(self, name: &str, kind: ColumnKind, options: &ColumnOptions) -> Self {
        let spec = column_for(self.strategy, &kind, &DialectOverrides::default(), options);
        self.column_spec(name, spec)
    }

    /// Adds a column with a precomputed spec.
    #[must_use]
    pub fn column_spec(mut self, name: &str, spec: ColumnSpec) -> Self {
        self.table.columns.push(ColumnDef {
            name: name.to_string(),
            spec,
        });
        self
    }

    /// Sets the primary key.
    #[must_use]
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.table.primary_key = owned(columns);
        self
    }

    /// Adds an inline unique constraint.
    #[must_use]
    pub fn unique(mut self, name: &str, columns: &[&str]) -> Self {
        self.table.uniques.push(UniqueDef {
            name: name.to_string(),
            columns: owned(columns),
        });
        self
    }

    /// Adds a secondary index.
    #[must_use]
    pub fn index(mut self, name: &str, columns: &[&str]) -> Self {
        let index = IndexDef {
            name: name.to_string(),
            table: self.table.name.clone(),
            columns: owned(columns),
            unique: false,
        };
        self.table.indexes.push(index);
        self
    }

    /// Adds a unique secondary index.
    #[must_use]
    pub fn unique_index(mut self, name: &str, columns: &[&str]) -> Self {
        let index = IndexDef {
            name: name.to_string(),
            table: self.table.name.clone(),
            columns: owned(columns),
            unique: true,
        };
        self.table.indexes.push(index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(
        mut self,
        name: &str,
        columns: &[&str],
        parent_table: &str,
        parent_columns: &[&str],
        on_delete: ReferentialAction,
    ) -> Self {
        let foreign_key = ForeignKeyDef {
            name: name.to_string(),
            table: self.table.name.clone(),
            columns: owned(columns),
            parent_table: parent_table.to_string(),
            parent_columns: owned(parent_columns),
            on_delete,
        };
        self.table.foreign_keys.push(foreign_key);
        self
    }

    /// Sets the MySQL collation.
    #[must_use]
    pub const fn collation(mut self, collation: MysqlCollation) -> Self {
        self.table.collation = Some(collation);
        self
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> TableDef {
        self.table
    }
}

/// Copies a slice of names into owned strings.
fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}
