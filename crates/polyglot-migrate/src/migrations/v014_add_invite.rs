// polyglot-migrate/src/migrations/v014_add_invite.rs
// ============================================================================
// Module: Migration 014
// Description: Pending project invitations by email.
// ============================================================================

use super::create_table;
use super::drop_table;
use super::shapes::invite_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Creates `invite`.
pub struct AddInvite;

impl MigrationUnit for AddInvite {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(14)
    }

    fn label(&self) -> &'static str {
        "add-invite"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let table = invite_table(ctx.strategy());
        create_table(ctx, &table)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let table = invite_table(ctx.strategy());
        drop_table(ctx, &table)
    }
}
