// polyglot-migrate/src/migrations/v002_initial_schema.rs
// ============================================================================
// Module: Migration 002
// Description: Creates users, projects, locales, terms and translations.
// ============================================================================

use polyglot_core::Dialect;
use polyglot_core::TableDef;

use super::create_table;
use super::drop_table;
use super::shapes;
use super::shapes::ProjectShape;
use super::shapes::TranslationShape;
use super::shapes::UserShape;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Initial tables, parents before children.
pub struct InitialSchema;

impl InitialSchema {
    /// Returns the tables in creation order.
    fn tables(ctx: &MigrationContext<'_>) -> Vec<TableDef> {
        let strategy = ctx.strategy();
        vec![
            shapes::user_table(strategy, UserShape::default()),
            shapes::project_table(strategy, ProjectShape::default()),
            shapes::locale_table(strategy),
            shapes::project_locale_table(strategy),
            shapes::term_table(strategy, false),
            shapes::translation_table(
                strategy,
                TranslationShape {
                    surrogate_id: true,
                    long_value: false,
                },
            ),
            shapes::project_user_table(strategy, false),
        ]
    }
}

impl MigrationUnit for InitialSchema {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(2)
    }

    fn label(&self) -> &'static str {
        "initial-schema"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        if ctx.dialect() == Dialect::Postgres {
            ctx.execute("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"")?;
        }
        for table in Self::tables(ctx) {
            create_table(ctx, &table)?;
        }
        Ok(())
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        for table in Self::tables(ctx).iter().rev() {
            drop_table(ctx, table)?;
        }
        Ok(())
    }
}
