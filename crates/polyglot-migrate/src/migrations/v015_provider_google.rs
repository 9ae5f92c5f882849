// polyglot-migrate/src/migrations/v015_provider_google.rs
// ============================================================================
// Module: Migration 015
// Description: Allows users without a local password.
// ============================================================================

use super::alter_column;
use super::shapes::UserShape;
use super::shapes::user_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// `user.encrypted_password` becomes nullable for externally authenticated
/// users. Reverting fails while any user has no password.
pub struct ProviderGoogle;

impl MigrationUnit for ProviderGoogle {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(15)
    }

    fn label(&self) -> &'static str {
        "provider-google"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(
            ctx.strategy(),
            UserShape {
                tos_fields: false,
                project_counter: true,
                nullable_password: true,
            },
        );
        alter_column(ctx, after, "encrypted_password")
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(
            ctx.strategy(),
            UserShape {
                project_counter: true,
                ..UserShape::default()
            },
        );
        alter_column(ctx, after, "encrypted_password")
    }
}
