// polyglot-migrate/src/rebuild.rs
// ============================================================================
// Module: Shadow Table Rebuild
// Description: Replace a SQLite table with a new shape while keeping its rows.
// Purpose: Express column drops, retypes and key changes SQLite cannot ALTER.
// Dependencies: polyglot-core
// ============================================================================

//! ## Overview
//! [`ShadowRebuild`] is the one primitive behind every change `SQLite` cannot
//! express with `ALTER TABLE`. It runs inside the caller's transaction with
//! foreign-key enforcement already disabled by the engine:
//!
//! 1. Capture the index and trigger DDL attached to the table.
//! 2. Create `<table>_shadow` in the target shape.
//! 3. Copy rows through an explicit column list: target columns that exist
//!    in the old table, or that have a source expression in the mapping.
//! 4. Drop the old table and rename the shadow into place.
//! 5. Re-create the target's own indexes and foreign-key triggers, then the
//!    captured objects that are still missing and not skipped, then any
//!    extra statements.
//!
//! A failure at any step propagates; the engine's rollback restores the
//! original table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use polyglot_core::Dialect;
use polyglot_core::SqlValue;
use polyglot_core::TableDef;

use crate::unit::MigrationContext;
use crate::unit::StepError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix of the temporary shadow table.
const SHADOW_SUFFIX: &str = "_shadow";

/// Lists index and trigger DDL attached to a table.
const ATTACHED_OBJECTS_SQL: &str = "SELECT name, sql FROM sqlite_master WHERE tbl_name = ?1 AND \
                                    type IN ('index', 'trigger') AND sql IS NOT NULL ORDER BY \
                                    type, name";

/// Checks whether a named schema object exists.
const OBJECT_EXISTS_SQL: &str = "SELECT 1 FROM sqlite_master WHERE name = ?1";

// ============================================================================
// SECTION: Column Mapping
// ============================================================================

/// Source expressions for target columns.
///
/// Target columns without an entry copy the same-named old column when it
/// exists and otherwise take their default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Target column to SQL expression over the old table.
    sources: BTreeMap<String, String>,
}

impl ColumnMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills `column` from `expression`.
    #[must_use]
    pub fn with_source(mut self, column: &str, expression: &str) -> Self {
        self.sources.insert(column.to_string(), expression.to_string());
        self
    }

    /// Returns the expression for `column`, if mapped.
    #[must_use]
    pub fn source_for(&self, column: &str) -> Option<&str> {
        self.sources.get(column).map(String::as_str)
    }
}

// ============================================================================
// SECTION: Rebuild
// ============================================================================

/// Shadow-table replace of one table.
#[derive(Debug, Clone)]
pub struct ShadowRebuild {
    /// Post-change shape.
    target: TableDef,
    /// Column sources.
    mapping: ColumnMapping,
    /// Captured object names not to re-create.
    skip_objects: BTreeSet<String>,
    /// Statements run after the re-creation.
    extra_objects: Vec<String>,
}

/// Outcome of a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Rows copied into the new table.
    pub copied_rows: u64,
    /// Target columns filled from the old table or a mapping.
    pub copied_columns: Vec<String>,
    /// Captured objects re-created from their saved DDL.
    pub restored_objects: Vec<String>,
}

impl ShadowRebuild {
    /// Rebuilds into `target` with no mapping.
    #[must_use]
    pub fn new(target: TableDef) -> Self {
        Self {
            target,
            mapping: ColumnMapping::default(),
            skip_objects: BTreeSet::new(),
            extra_objects: Vec::new(),
        }
    }

    /// Sets the column mapping.
    #[must_use]
    pub fn mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Drops a captured index or trigger instead of re-creating it.
    #[must_use]
    pub fn skip_object(mut self, name: &str) -> Self {
        self.skip_objects.insert(name.to_string());
        self
    }

    /// Appends a statement run after the rebuild.
    #[must_use]
    pub fn extra_object(mut self, sql: String) -> Self {
        self.extra_objects.push(sql);
        self
    }

    /// Runs the rebuild inside the context's transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Schema`] on a non-`SQLite` dialect or when the
    /// table is missing, and [`StepError::Executor`] when a statement fails.
    pub fn run(&self, ctx: &mut MigrationContext<'_>) -> Result<RebuildSummary, StepError> {
        if ctx.dialect() != Dialect::Sqlite {
            return Err(StepError::Schema(format!(
                "table rebuild is only used on sqlite, not {}",
                ctx.dialect()
            )));
        }
        ctx.execute("PRAGMA defer_foreign_keys = ON")?;
        ctx.execute("PRAGMA legacy_alter_table = ON")?;
        let outcome = self.replace_table(ctx);
        let restored = ctx.execute("PRAGMA legacy_alter_table = OFF");
        match (outcome, restored) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), restored) => {
                if let Err(restore_err) = restored {
                    tracing::warn!(error = %restore_err, "failed to reset legacy_alter_table");
                }
                Err(err)
            }
        }
    }

    /// Runs steps 1 to 5 with the rename pragma already set.
    fn replace_table(&self, ctx: &mut MigrationContext<'_>) -> Result<RebuildSummary, StepError> {
        let strategy = ctx.strategy();
        let table = self.target.name.as_str();
        let shadow = format!("{table}{SHADOW_SUFFIX}");

        let captured = self.capture_objects(ctx)?;
        let existing = existing_columns(ctx, table)?;
        if existing.is_empty() {
            return Err(StepError::Schema(format!("table {table} does not exist")));
        }

        ctx.execute(&strategy.drop_table(&shadow))?;
        ctx.execute(&strategy.create_table_statement(&self.target, &shadow))?;

        let mut targets = Vec::new();
        let mut sources = Vec::new();
        for column in &self.target.columns {
            let physical = strategy.column_name(&column.name);
            if let Some(expression) = self.mapping.source_for(&column.name) {
                targets.push(column.name.clone());
                sources.push(expression.to_string());
            } else if existing.contains(&physical) {
                targets.push(column.name.clone());
                sources.push(strategy.quote_identifier(&physical));
            }
        }
        let copied_rows = if targets.is_empty() {
            0
        } else {
            let sql = format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                strategy.quote_identifier(&shadow),
                strategy.column_list(&targets),
                sources.join(", "),
                strategy.quote_identifier(table)
            );
            ctx.execute_with(&sql, &[])?
        };

        ctx.execute(&strategy.drop_table(table))?;
        ctx.execute(&strategy.rename_table(&shadow, table))?;
        ctx.execute_all(strategy.dependent_objects(&self.target))?;

        let mut restored_objects = Vec::new();
        for (name, sql) in captured {
            if self.skip_objects.contains(&name) || object_exists(ctx, &name)? {
                continue;
            }
            ctx.execute(&sql)?;
            restored_objects.push(name);
        }
        ctx.execute_all(self.extra_objects.iter().cloned())?;

        tracing::debug!(
            table,
            copied_rows,
            restored = restored_objects.len(),
            "sqlite table rebuilt"
        );
        Ok(RebuildSummary {
            copied_rows,
            copied_columns: targets,
            restored_objects,
        })
    }

    /// Reads the DDL of indexes and triggers attached to the table.
    fn capture_objects(
        &self,
        ctx: &mut MigrationContext<'_>,
    ) -> Result<Vec<(String, String)>, StepError> {
        let rows = ctx.query(ATTACHED_OBJECTS_SQL, &[SqlValue::from(self.target.name.as_str())])?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name = row.first().and_then(SqlValue::as_text)?;
                let sql = row.get(1).and_then(SqlValue::as_text)?;
                Some((name, sql))
            })
            .collect())
    }
}

/// Returns the physical column names of `table`.
fn existing_columns(
    ctx: &mut MigrationContext<'_>,
    table: &str,
) -> Result<BTreeSet<String>, StepError> {
    let sql = ctx.strategy().column_names_sql();
    let rows = ctx.query(&sql, &[SqlValue::from(table)])?;
    Ok(rows.into_iter().filter_map(|row| row.first().and_then(SqlValue::as_text)).collect())
}

/// Returns true when a schema object named `name` exists.
fn object_exists(ctx: &mut MigrationContext<'_>, name: &str) -> Result<bool, StepError> {
    Ok(!ctx.query(OBJECT_EXISTS_SQL, &[SqlValue::from(name)])?.is_empty())
}
