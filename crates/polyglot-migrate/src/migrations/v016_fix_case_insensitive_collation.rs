// polyglot-migrate/src/migrations/v016_fix_case_insensitive_collation.rs
// ============================================================================
// Module: Migration 016
// Description: Makes MySQL string comparison case sensitive.
// ============================================================================

use polyglot_core::MysqlCollation;

use super::convert_collation;
use super::shapes::COLLATION_TABLES;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Moves every MySQL table to `utf8mb4_bin` so terms differing only in case
/// are distinct.
pub struct FixCaseInsensitiveCollation;

impl MigrationUnit for FixCaseInsensitiveCollation {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(16)
    }

    fn label(&self) -> &'static str {
        "fix-case-insensitive-collation"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        convert_collation(ctx, &COLLATION_TABLES, MysqlCollation::Bin)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        convert_collation(ctx, &COLLATION_TABLES, MysqlCollation::UnicodeCi)
    }
}
