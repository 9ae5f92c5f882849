// polyglot-migrate/src/migrations/v017_add_label.rs
// ============================================================================
// Module: Migration 017
// Description: Colored labels scoped to a project.
// ============================================================================

use super::create_table;
use super::drop_table;
use super::shapes::label_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Creates `label`.
pub struct AddLabel;

impl MigrationUnit for AddLabel {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(17)
    }

    fn label(&self) -> &'static str {
        "add-label"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let table = label_table(ctx.strategy());
        create_table(ctx, &table)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let table = label_table(ctx.strategy());
        drop_table(ctx, &table)
    }
}
