// polyglot-migrate/src/migrations/v005_fix_translations_primary_key.rs
// ============================================================================
// Module: Migration 005
// Description: Replaces the translation surrogate key with (term, locale).
// ============================================================================

use polyglot_core::Dialect;

use super::add_columns;
use super::rebuild;
use super::shapes::TranslationShape;
use super::shapes::translation_table;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Composite key columns.
const COMPOSITE_KEY: [&str; 2] = ["term_id", "project_locale_id"];

/// Drops `translation.id`; one translation per term and project locale.
pub struct FixTranslationsPrimaryKey;

impl MigrationUnit for FixTranslationsPrimaryKey {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(5)
    }

    fn label(&self) -> &'static str {
        "fix-translations-primary-key"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let strategy = ctx.strategy();
        if ctx.dialect() == Dialect::Sqlite {
            return rebuild(ctx, translation_table(strategy, TranslationShape::default()));
        }
        ctx.execute(&strategy.drop_primary_key("translation")?)?;
        ctx.execute(&strategy.drop_column("translation", "id")?)?;
        let key = COMPOSITE_KEY.map(str::to_string);
        ctx.execute(&strategy.add_primary_key("translation", &key)?)
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let strategy = ctx.strategy();
        let after = translation_table(
            strategy,
            TranslationShape {
                surrogate_id: true,
                long_value: false,
            },
        );
        match ctx.dialect() {
            Dialect::Sqlite => rebuild(ctx, after),
            Dialect::Postgres | Dialect::Mysql => {
                if ctx.dialect() == Dialect::Postgres {
                    ctx.execute("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"")?;
                }
                ctx.execute(&strategy.drop_primary_key("translation")?)?;
                add_columns(ctx, &after, &["id"])?;
                ctx.execute(&strategy.add_primary_key("translation", &["id".to_string()])?)
            }
        }
    }
}
