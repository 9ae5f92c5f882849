// polyglot-migrate/src/migrations/mod.rs
// ============================================================================
// Module: Schema History
// Description: The built-in migration units and the operations they share.
// Purpose: Describe every schema change once, rendered per dialect.
// Dependencies: polyglot-core, crate::rebuild
// ============================================================================

//! ## Overview
//! Units describe changes in terms of table shapes; the strategy decides how
//! each change is rendered. Where `SQLite` cannot express a change with
//! `ALTER TABLE`, the shared helpers fall back to [`ShadowRebuild`] with the
//! post-change shape as the target.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod shapes;

mod v001_create_migration_ledger;
mod v002_initial_schema;
mod v003_add_project_user_role;
mod v004_add_project_plans;
mod v005_fix_translations_primary_key;
mod v006_change_translation_value_type;
mod v007_add_project_description;
mod v008_add_tos_and_privacy_fields;
mod v009_project_users_index;
mod v010_project_clients_table;
mod v011_per_user_project_limits;
mod v012_remove_tos_and_privacy;
mod v013_set_default_encoding;
mod v014_add_invite;
mod v015_provider_google;
mod v016_fix_case_insensitive_collation;
mod v017_add_label;
mod v018_add_label_join_tables;
mod v019_add_term_context;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use polyglot_core::DdlError;
use polyglot_core::MysqlCollation;
use polyglot_core::TableDef;

use crate::rebuild::ShadowRebuild;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::StepError;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Returns the built-in units in ascending version order.
#[must_use]
pub fn standard_units() -> Vec<Arc<dyn MigrationUnit>> {
    vec![
        Arc::new(v001_create_migration_ledger::CreateMigrationLedger),
        Arc::new(v002_initial_schema::InitialSchema),
        Arc::new(v003_add_project_user_role::AddProjectUserRole),
        Arc::new(v004_add_project_plans::AddProjectPlans),
        Arc::new(v005_fix_translations_primary_key::FixTranslationsPrimaryKey),
        Arc::new(v006_change_translation_value_type::ChangeTranslationValueType),
        Arc::new(v007_add_project_description::AddProjectDescription),
        Arc::new(v008_add_tos_and_privacy_fields::AddTosAndPrivacyFields),
        Arc::new(v009_project_users_index::ProjectUsersIndex),
        Arc::new(v010_project_clients_table::ProjectClientsTable),
        Arc::new(v011_per_user_project_limits::PerUserProjectLimits),
        Arc::new(v012_remove_tos_and_privacy::RemoveTosAndPrivacy),
        Arc::new(v013_set_default_encoding::SetDefaultEncoding),
        Arc::new(v014_add_invite::AddInvite),
        Arc::new(v015_provider_google::ProviderGoogle),
        Arc::new(v016_fix_case_insensitive_collation::FixCaseInsensitiveCollation),
        Arc::new(v017_add_label::AddLabel),
        Arc::new(v018_add_label_join_tables::AddLabelJoinTables),
        Arc::new(v019_add_term_context::AddTermContext),
    ]
}

// ============================================================================
// SECTION: Shared Operations
// ============================================================================

/// Creates `table` with its indexes and key emulation.
fn create_table(ctx: &mut MigrationContext<'_>, table: &TableDef) -> Result<(), StepError> {
    let statements = ctx.strategy().create_table(table);
    ctx.execute_all(statements)
}

/// Drops `table`, removing emulated foreign keys first so no trigger on a
/// parent table outlives it.
fn drop_table(ctx: &mut MigrationContext<'_>, table: &TableDef) -> Result<(), StepError> {
    let strategy = ctx.strategy();
    if strategy.emulates_foreign_keys() {
        for foreign_key in &table.foreign_keys {
            ctx.execute_all(strategy.drop_foreign_key(foreign_key))?;
        }
    }
    ctx.execute(&strategy.drop_table(&table.name))
}

/// Adds `columns` of `after` to the existing table.
fn add_columns(
    ctx: &mut MigrationContext<'_>,
    after: &TableDef,
    columns: &[&str],
) -> Result<(), StepError> {
    let strategy = ctx.strategy();
    for name in columns {
        let column = after
            .column(name)
            .ok_or_else(|| StepError::Schema(format!("{} has no column {name}", after.name)))?;
        ctx.execute(&strategy.add_column(&after.name, column))?;
    }
    Ok(())
}

/// Drops `columns`, rebuilding into `after` where the dialect cannot.
fn drop_columns(
    ctx: &mut MigrationContext<'_>,
    after: TableDef,
    columns: &[&str],
) -> Result<(), StepError> {
    let strategy = ctx.strategy();
    let mut statements = Vec::with_capacity(columns.len());
    for column in columns {
        match strategy.drop_column(&after.name, column) {
            Ok(statement) => statements.push(statement),
            Err(DdlError::Unsupported {
                ..
            }) => return rebuild(ctx, after),
        }
    }
    ctx.execute_all(statements)
}

/// Changes one column to its definition in `after`, rebuilding where the
/// dialect cannot alter in place.
fn alter_column(
    ctx: &mut MigrationContext<'_>,
    after: TableDef,
    column: &str,
) -> Result<(), StepError> {
    let strategy = ctx.strategy();
    let definition = after
        .column(column)
        .ok_or_else(|| StepError::Schema(format!("{} has no column {column}", after.name)))?;
    match strategy.alter_column(&after.name, definition) {
        Ok(statements) => ctx.execute_all(statements),
        Err(DdlError::Unsupported {
            ..
        }) => rebuild(ctx, after),
    }
}

/// Rebuilds a table into `after` with default column mapping.
fn rebuild(ctx: &mut MigrationContext<'_>, after: TableDef) -> Result<(), StepError> {
    ShadowRebuild::new(after).run(ctx)?;
    Ok(())
}

/// Converts `tables` to `collation` where the dialect stores per-table
/// character sets; logs a no-op elsewhere.
fn convert_collation(
    ctx: &mut MigrationContext<'_>,
    tables: &[&str],
    collation: MysqlCollation,
) -> Result<(), StepError> {
    let strategy = ctx.strategy();
    let statements: Vec<String> = tables
        .iter()
        .filter_map(|table| strategy.convert_table_collation(table, collation))
        .collect();
    if statements.is_empty() {
        tracing::info!(
            dialect = %strategy.dialect(),
            collation = collation.as_str(),
            "dialect stores utf-8 by default; no encoding change needed"
        );
        return Ok(());
    }
    if let Some(disable) = strategy.foreign_key_checks(false) {
        ctx.execute(&disable)?;
    }
    let outcome = ctx.execute_all(statements);
    if let Some(enable) = strategy.foreign_key_checks(true) {
        let restored = ctx.execute(&enable);
        if outcome.is_ok() {
            restored?;
        }
    }
    outcome
}
