// polyglot-authz/src/membership.rs
// ============================================================================
// Module: Membership Queries
// Description: Loads memberships with their project and plan.
// Purpose: Read and update quota state through the executor seam.
// Dependencies: polyglot-core
// ============================================================================

//! ## Overview
//! Users reach a project through `project_user`; API clients belong to one
//! project through `project_client`. Both paths join the project and, when
//! it still exists, the plan. Column names pass through the strategy so the
//! same queries run on every dialect.

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_core::DialectStrategy;
use polyglot_core::ExecutorError;
use polyglot_core::Membership;
use polyglot_core::Plan;
use polyglot_core::PlanCode;
use polyglot_core::Principal;
use polyglot_core::Project;
use polyglot_core::ProjectId;
use polyglot_core::Role;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlRow;
use polyglot_core::SqlValue;

use crate::quota::QuotaDelta;

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Loads the membership of `principal` on `project_id`.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the query fails or a row cannot be decoded.
pub fn load_membership(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
    principal: &Principal,
    project_id: &ProjectId,
) -> Result<Option<Membership>, ExecutorError> {
    let sql = membership_sql(strategy, principal);
    let rows = executor.query(&sql, &[
        SqlValue::from(principal.id_str()),
        SqlValue::from(project_id.as_str()),
    ])?;
    rows.first().map(|row| decode_membership(principal, row)).transpose()
}

/// Takes the row lock on `project_id`; returns false when the project is gone.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the query fails.
pub fn lock_project(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
    project_id: &ProjectId,
) -> Result<bool, ExecutorError> {
    let sql = format!(
        "SELECT {id} FROM {project} WHERE {id} = {p1}{lock}",
        id = strategy.quote_column("id"),
        project = strategy.quote_identifier("project"),
        p1 = strategy.placeholder(1),
        lock = strategy.row_lock_suffix(),
    );
    Ok(!executor.query(&sql, &[SqlValue::from(project_id.as_str())])?.is_empty())
}

/// Applies `delta` to the project counters, never going below zero.
///
/// # Errors
///
/// Returns [`ExecutorError`] when the update fails.
pub fn apply_counters(
    executor: &mut dyn SqlExecutor,
    strategy: &dyn DialectStrategy,
    project_id: &ProjectId,
    delta: QuotaDelta,
) -> Result<(), ExecutorError> {
    if delta.is_zero() {
        return Ok(());
    }
    let greatest = strategy.greatest_function();
    let terms = strategy.quote_column("terms_count");
    let locales = strategy.quote_column("locales_count");
    let sql = format!(
        "UPDATE {project} SET {terms} = {greatest}({terms} + {p1}, 0), {locales} = \
         {greatest}({locales} + {p2}, 0) WHERE {id} = {p3}",
        project = strategy.quote_identifier("project"),
        id = strategy.quote_column("id"),
        p1 = strategy.placeholder(1),
        p2 = strategy.placeholder(2),
        p3 = strategy.placeholder(3),
    );
    executor.execute(&sql, &[
        SqlValue::Integer(delta.terms),
        SqlValue::Integer(delta.locales),
        SqlValue::from(project_id.as_str()),
    ])?;
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders the membership query for the principal's kind.
fn membership_sql(strategy: &dyn DialectStrategy, principal: &Principal) -> String {
    let (table, principal_column) = match principal {
        Principal::User(_) => ("project_user", "user_id"),
        Principal::ProjectClient(_) => ("project_client", "id"),
    };
    let c = |name: &str| strategy.quote_column(name);
    format!(
        "SELECT m.{role}, p.{id}, p.{name}, p.{terms}, p.{locales}, pl.{code}, pl.{name}, \
         pl.{max} FROM {table} m JOIN {project} p ON p.{id} = m.{project_id} LEFT JOIN {plan} pl \
         ON pl.{code} = p.{plan_code} WHERE m.{principal} = {p1} AND m.{project_id} = {p2}",
        role = c("role"),
        id = c("id"),
        name = c("name"),
        terms = c("terms_count"),
        locales = c("locales_count"),
        code = c("code"),
        max = c("max_strings"),
        plan_code = c("plan_code"),
        project_id = c("project_id"),
        principal = c(principal_column),
        table = strategy.quote_identifier(table),
        project = strategy.quote_identifier("project"),
        plan = strategy.quote_identifier("plan"),
        p1 = strategy.placeholder(1),
        p2 = strategy.placeholder(2),
    )
}

/// Decodes one membership row.
fn decode_membership(principal: &Principal, row: &SqlRow) -> Result<Membership, ExecutorError> {
    let text = |index: usize| row.get(index).and_then(SqlValue::as_text);
    let integer = |index: usize| row.get(index).and_then(SqlValue::as_i64);
    let malformed = |field: &str| ExecutorError::Decode(format!("membership row missing {field}"));

    let role_text = text(0).ok_or_else(|| malformed("role"))?;
    let role = Role::parse(&role_text)
        .ok_or_else(|| ExecutorError::Decode(format!("unknown role {role_text}")))?;
    let plan = match text(5) {
        Some(code) => Some(Plan {
            code: PlanCode::new(code),
            name: text(6).ok_or_else(|| malformed("plan name"))?,
            max_strings: integer(7).ok_or_else(|| malformed("plan max_strings"))?,
        }),
        None => None,
    };
    Ok(Membership {
        principal: principal.clone(),
        role,
        project: Project {
            id: ProjectId::new(text(1).ok_or_else(|| malformed("project id"))?),
            name: text(2).ok_or_else(|| malformed("project name"))?,
            terms_count: integer(3).ok_or_else(|| malformed("terms_count"))?,
            locales_count: integer(4).ok_or_else(|| malformed("locales_count"))?,
            plan,
        },
    })
}
