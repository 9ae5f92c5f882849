// polyglot-migrate/src/migrations/v009_project_users_index.rs
// ============================================================================
// Module: Migration 009
// Description: One membership per user and project.
// ============================================================================

use polyglot_core::IndexDef;

use super::shapes::PROJECT_USER_INDEX;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Unique index on `project_user (project_id, user_id)`.
pub struct ProjectUsersIndex;

impl MigrationUnit for ProjectUsersIndex {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(9)
    }

    fn label(&self) -> &'static str {
        "project-users-index"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let index = IndexDef {
            name: PROJECT_USER_INDEX.to_string(),
            table: "project_user".to_string(),
            columns: vec!["project_id".to_string(), "user_id".to_string()],
            unique: true,
        };
        let statement = ctx.strategy().create_index(&index);
        ctx.execute(&statement)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let statement = ctx.strategy().drop_index(PROJECT_USER_INDEX, "project_user");
        ctx.execute(&statement)
    }
}
