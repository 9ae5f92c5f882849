// polyglot-migrate/src/migrations/v019_add_term_context.rs
// ============================================================================
// Module: Migration 019
// Description: Free-form context notes on terms.
// ============================================================================

use super::add_columns;
use super::drop_columns;
use super::shapes::term_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Adds nullable `term.context`.
pub struct AddTermContext;

impl MigrationUnit for AddTermContext {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(19)
    }

    fn label(&self) -> &'static str {
        "add-term-context"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = term_table(ctx.strategy(), true);
        add_columns(ctx, &after, &["context"])
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = term_table(ctx.strategy(), false);
        drop_columns(ctx, after, &["context"])
    }
}
