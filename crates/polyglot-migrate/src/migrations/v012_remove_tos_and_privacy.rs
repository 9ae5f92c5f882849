// polyglot-migrate/src/migrations/v012_remove_tos_and_privacy.rs
// ============================================================================
// Module: Migration 012
// Description: Removes the terms-of-service acceptance columns.
// ============================================================================

use polyglot_core::Dialect;

use super::add_columns;
use super::drop_columns;
use super::rebuild;
use super::shapes::UserShape;
use super::shapes::user_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Columns removed by this unit.
const TOS_COLUMNS: [&str; 2] = ["tos_and_privacy_accepted_date", "tos_and_privacy_accepted_version"];

/// Drops the acceptance columns from `user`; `SQLite` rebuilds the table.
pub struct RemoveTosAndPrivacy;

impl MigrationUnit for RemoveTosAndPrivacy {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(12)
    }

    fn label(&self) -> &'static str {
        "remove-tos-and-privacy"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(
            ctx.strategy(),
            UserShape {
                project_counter: true,
                ..UserShape::default()
            },
        );
        drop_columns(ctx, after, &TOS_COLUMNS)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(
            ctx.strategy(),
            UserShape {
                tos_fields: true,
                project_counter: true,
                nullable_password: false,
            },
        );
        // SQLite rebuilds so the columns land before num_projects_created,
        // where unit 008 put them.
        if ctx.dialect() == Dialect::Sqlite {
            return rebuild(ctx, after);
        }
        add_columns(ctx, &after, &TOS_COLUMNS)
    }
}
