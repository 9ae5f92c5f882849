// polyglot-migrate/src/migrations/v007_add_project_description.rs
// ============================================================================
// Module: Migration 007
// Description: Adds an optional project description.
// ============================================================================

use super::add_columns;
use super::drop_columns;
use super::shapes::ProjectShape;
use super::shapes::project_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Adds `project.description`.
pub struct AddProjectDescription;

impl MigrationUnit for AddProjectDescription {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(7)
    }

    fn label(&self) -> &'static str {
        "add-project-description"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = project_table(
            ctx.strategy(),
            ProjectShape {
                plan: true,
                description: true,
            },
        );
        add_columns(ctx, &after, &["description"])
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = project_table(
            ctx.strategy(),
            ProjectShape {
                plan: true,
                description: false,
            },
        );
        drop_columns(ctx, after, &["description"])
    }
}
