// polyglot-migrate/src/migrations/v008_add_tos_and_privacy_fields.rs
// ============================================================================
// Module: Migration 008
// Description: Records terms-of-service acceptance on users.
// ============================================================================

use super::add_columns;
use super::drop_columns;
use super::shapes::UserShape;
use super::shapes::user_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Columns added by this unit.
const TOS_COLUMNS: [&str; 2] = ["tos_and_privacy_accepted_date", "tos_and_privacy_accepted_version"];

/// Adds the acceptance date and version columns to `user`.
pub struct AddTosAndPrivacyFields;

impl MigrationUnit for AddTosAndPrivacyFields {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(8)
    }

    fn label(&self) -> &'static str {
        "add-tos-and-privacy-fields"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(
            ctx.strategy(),
            UserShape {
                tos_fields: true,
                ..UserShape::default()
            },
        );
        add_columns(ctx, &after, &TOS_COLUMNS)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(ctx.strategy(), UserShape::default());
        drop_columns(ctx, after, &TOS_COLUMNS)
    }
}
