// polyglot-migrate/src/migrations/v003_add_project_user_role.rs
// ============================================================================
// Module: Migration 003
// Description: Adds the member role to project_user.
// ============================================================================

use polyglot_core::Dialect;

use super::add_columns;
use super::drop_columns;
use super::rebuild;
use super::shapes::project_user_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Adds `project_user.role`, defaulting existing members to viewer.
///
/// `SQLite` rebuilds the table so the role's check constraint is part of
/// the table definition.
pub struct AddProjectUserRole;

impl MigrationUnit for AddProjectUserRole {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(3)
    }

    fn label(&self) -> &'static str {
        "add-project-user-role"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = project_user_table(ctx.strategy(), true);
        if ctx.dialect() == Dialect::Sqlite {
            rebuild(ctx, after)
        } else {
            add_columns(ctx, &after, &["role"])
        }
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = project_user_table(ctx.strategy(), false);
        drop_columns(ctx, after, &["role"])
    }
}
