// polyglot-migrate/src/migrations/v018_add_label_join_tables.rs
// ============================================================================
// Module: Migration 018
// Description: Attaches labels to terms and translations.
// ============================================================================

use super::create_table;
use super::drop_table;
use super::shapes::label_terms_table;
use super::shapes::label_translations_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Creates `label_terms_term` and `label_translations_translation`.
pub struct AddLabelJoinTables;

impl MigrationUnit for AddLabelJoinTables {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(18)
    }

    fn label(&self) -> &'static str {
        "add-label-join-tables"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let strategy = ctx.strategy();
        create_table(ctx, &label_terms_table(strategy))?;
        create_table(ctx, &label_translations_table(strategy))
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let strategy = ctx.strategy();
        drop_table(ctx, &label_translations_table(strategy))?;
        drop_table(ctx, &label_terms_table(strategy))
    }
}
