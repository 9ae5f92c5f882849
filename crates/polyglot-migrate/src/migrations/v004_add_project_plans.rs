// polyglot-migrate/src/migrations/v004_add_project_plans.rs
// ============================================================================
// Module: Migration 004
// Description: Adds plans, project quota counters and the plan reference.
// ============================================================================

//! ## Overview
//! Creates `plan`, seeds the two built-in plans, and gives `project` its
//! term and locale counters plus a nullable `plan_code` that is cleared when
//! the plan is deleted. `SQLite` rebuilds `project` so the generated
//! foreign-key triggers and the `plan_code` index come from one shape.

use polyglot_core::Dialect;
use polyglot_core::SqlValue;

use super::add_columns;
use super::create_table;
use super::drop_table;
use super::rebuild;
use super::shapes::PROJECT_PLAN_INDEX;
use super::shapes::ProjectShape;
use super::shapes::plan_table;
use super::shapes::project_table;
use crate::rebuild::ShadowRebuild;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::StepError;

/// Built-in plans: code, display name, string limit.
const SEED_PLANS: [(&str, &str, i64); 2] =
    [("default", "Default", 100), ("open-source", "Open source", 100_000)];

/// Plans and quota counters.
pub struct AddProjectPlans;

impl MigrationUnit for AddProjectPlans {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(4)
    }

    fn label(&self) -> &'static str {
        "add-project-plans"
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let strategy = ctx.strategy();
        create_table(ctx, &plan_table(strategy))?;
        let after = project_table(
            strategy,
            ProjectShape {
                plan: true,
                description: false,
            },
        );
        if ctx.dialect() == Dialect::Sqlite {
            rebuild(ctx, after.clone())?;
        } else {
            add_columns(ctx, &after, &["terms_count", "locales_count", "plan_code"])?;
            for foreign_key in &after.foreign_keys {
                ctx.execute_all(strategy.add_foreign_key(foreign_key))?;
            }
        }
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({}, {}, {})",
            strategy.quote_identifier("plan"),
            strategy.column_list(&["code".to_string(), "name".to_string(), "max_strings".to_string()]),
            strategy.placeholder(1),
            strategy.placeholder(2),
            strategy.placeholder(3)
        );
        for (code, name, max_strings) in SEED_PLANS {
            ctx.execute_with(
                &insert,
                &[SqlValue::from(code), SqlValue::from(name), SqlValue::Integer(max_strings)],
            )?;
        }
        Ok(())
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        let strategy = ctx.strategy();
        let delete = format!(
            "DELETE FROM {} WHERE {} = {}",
            strategy.quote_identifier("plan"),
            strategy.quote_column("code"),
            strategy.placeholder(1)
        );
        for (code, _, _) in SEED_PLANS {
            ctx.execute_with(&delete, &[SqlValue::from(code)])?;
        }
        let with_plan = project_table(
            strategy,
            ProjectShape {
                plan: true,
                description: false,
            },
        );
        let without_plan = project_table(strategy, ProjectShape::default());
        if ctx.dialect() == Dialect::Sqlite {
            let mut rebuild = ShadowRebuild::new(without_plan).skip_object(PROJECT_PLAN_INDEX);
            for foreign_key in &with_plan.foreign_keys {
                let stem = foreign_key.trigger_stem();
                rebuild = rebuild
                    .skip_object(&format!("{stem}_insert"))
                    .skip_object(&format!("{stem}_update"));
            }
            rebuild.run(ctx)?;
        } else {
            for foreign_key in &with_plan.foreign_keys {
                ctx.execute_all(strategy.drop_foreign_key(foreign_key))?;
            }
            for column in ["plan_code", "locales_count", "terms_count"] {
                ctx.execute(&strategy.drop_column("project", column)?)?;
            }
        }
        drop_table(ctx, &plan_table(strategy))
    }
}
