// polyglot-migrate/src/migrations/v013_set_default_encoding.rs
// ============================================================================
// Module: Migration 013
// Description: Converts MySQL tables to utf8mb4 with unicode collation.
// ============================================================================

use polyglot_core::Dialect;
use polyglot_core::MysqlCollation;

use super::convert_collation;
use super::shapes::ENCODING_TABLES;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::Reversibility;
use crate::unit::StepError;

/// Moves every MySQL table to `utf8mb4_unicode_ci`. The previous encoding is
/// unknown, so the change cannot be reverted.
pub struct SetDefaultEncoding;

impl MigrationUnit for SetDefaultEncoding {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(13)
    }

    fn label(&self) -> &'static str {
        "set-default-encoding"
    }

    fn reversibility(&self, _dialect: Dialect) -> Reversibility {
        Reversibility::Irreversible
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        convert_collation(ctx, &ENCODING_TABLES, MysqlCollation::UnicodeCi)
    }

    fn down(&self, _ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        Ok(())
    }
}
