// polyglot-migrate/src/migrations/v010_project_clients_table.rs
// ============================================================================
// Module: Migration 010
// Description: API client credentials scoped to a project.
// ============================================================================

use super::create_table;
use super::drop_table;
use super::shapes::project_client_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Creates `project_client`.
pub struct ProjectClientsTable;

impl MigrationUnit for ProjectClientsTable {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(10)
    }

    fn label(&self) -> &'static str {
        "project-clients-table"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let table = project_client_table(ctx.strategy());
        create_table(ctx, &table)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let table = project_client_table(ctx.strategy());
        drop_table(ctx, &table)
    }
}
