// polyglot-migrate/src/migrations/v001_create_migration_ledger.rs
// ============================================================================
// Module: Migration 001
// Description: Creates the migration ledger table.
// ============================================================================

use super::create_table;
use crate::ledger::LEDGER_TABLE;
use crate::ledger::ledger_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Creates `migration_ledger`; every later unit records itself there.
pub struct CreateMigrationLedger;

impl MigrationUnit for CreateMigrationLedger {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(1)
    }

    fn label(&self) -> &'static str {
        "create-migration-ledger"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let table = ledger_table(ctx.strategy());
        create_table(ctx, &table)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let statement = ctx.strategy().drop_table(LEDGER_TABLE);
        ctx.execute(&statement)
    }
}
