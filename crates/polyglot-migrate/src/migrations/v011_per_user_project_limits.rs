// polyglot-migrate/src/migrations/v011_per_user_project_limits.rs
// ============================================================================
// Module: Migration 011
// Description: Counts projects created per user.
// ============================================================================

use super::add_columns;
use super::drop_columns;
use super::shapes::UserShape;
use super::shapes::user_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Adds `user.num_projects_created`.
pub struct PerUserProjectLimits;

impl MigrationUnit for PerUserProjectLimits {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(11)
    }

    fn label(&self) -> &'static str {
        "per-user-project-limits"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(
            ctx.strategy(),
            UserShape {
                tos_fields: true,
                project_counter: true,
                nullable_password: false,
            },
        );
        add_columns(ctx, &after, &["num_projects_created"])
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = user_table(
            ctx.strategy(),
            UserShape {
                tos_fields: true,
                ..UserShape::default()
            },
        );
        drop_columns(ctx, after, &["num_projects_created"])
    }
}
