// polyglot-migrate/src/migrations/v006_change_translation_value_type.rs
// ============================================================================
// Module: Migration 006
// Description: Stores translation values as unbounded text.
// ============================================================================

use polyglot_core::Dialect;

use super::alter_column;
use super::shapes::TranslationShape;
use super::shapes::translation_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::Reversibility;
use crate::unit::StepError;

/// `translation.value` becomes long text, NOT NULL.
pub struct ChangeTranslationValueType;

impl MigrationUnit for ChangeTranslationValueType {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(6)
    }

    fn label(&self) -> &'static str {
        "change-translation-value-type"
    }

    fn reversibility(&self, dialect: Dialect) -> Reversibility {
        if dialect == Dialect::Sqlite {
            Reversibility::Irreversible
        } else {
            Reversibility::Reversible
        }
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = translation_table(
            ctx.strategy(),
            TranslationShape {
                surrogate_id: false,
                long_value: true,
            },
        );
        alter_column(ctx, after, "value")
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let after = translation_table(ctx.strategy(), TranslationShape::default());
        alter_column(ctx, after, "value")
    }
}
