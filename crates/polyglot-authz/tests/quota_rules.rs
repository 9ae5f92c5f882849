// polyglot-authz/tests/quota_rules.rs
// ============================================================================
// Module: Quota Rule Tests
// Description: Pure checks of the string projection and import correction.
// Purpose: Pin the inclusive boundary and the dialect-specific adjustment.
// Dependencies: polyglot-authz, polyglot-core
// ============================================================================

//! ## Overview
//! No storage is involved; projects are built in memory.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_authz::AuthzError;
use polyglot_authz::QuotaDelta;
use polyglot_authz::QuotaViolation;
use polyglot_authz::quota::adjusted_delta;
use polyglot_authz::quota::check_quota;
use polyglot_authz::quota::projected_strings;
use polyglot_core::Dialect;
use polyglot_core::Plan;
use polyglot_core::PlanCode;
use polyglot_core::Project;
use polyglot_core::ProjectAction;
use polyglot_core::ProjectId;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn project(terms: i64, locales: i64, max_strings: Option<i64>) -> Project {
    Project {
        id: ProjectId::new("p"),
        name: "Project".to_string(),
        terms_count: terms,
        locales_count: locales,
        plan: max_strings.map(|max| Plan {
            code: PlanCode::new("plan"),
            name: "Plan".to_string(),
            max_strings: max,
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn boundary_is_inclusive() {
    let near = project(10, 10, Some(100));
    assert_eq!(check_quota(ProjectAction::AddTerm, &project(9, 10, Some(100)), QuotaDelta::terms(1)), Ok(()));
    assert_eq!(check_quota(ProjectAction::AddTerm, &near, QuotaDelta::terms(1)), Err(QuotaViolation {
        projected: 110,
        limit: 100,
    }));
    assert_eq!(check_quota(ProjectAction::AddTranslation, &near, QuotaDelta::ZERO), Ok(()));
}

#[test]
fn only_gated_actions_are_checked() {
    let full = project(50, 50, Some(10));
    for action in ProjectAction::ALL {
        let outcome = check_quota(action, &full, QuotaDelta::terms(1));
        assert_eq!(outcome.is_err(), action.is_quota_gated(), "{}", action.as_str());
    }
}

#[test]
fn missing_plan_rejects_with_zero_limit() {
    let orphan = project(0, 0, None);
    assert_eq!(check_quota(ProjectAction::AddTerm, &orphan, QuotaDelta::ZERO), Err(QuotaViolation {
        projected: 0,
        limit: 0,
    }));
    assert_eq!(check_quota(ProjectAction::EditTerm, &orphan, QuotaDelta::ZERO), Ok(()));
}

#[test]
fn projection_ignores_decreases_and_saturates() {
    assert_eq!(projected_strings(&project(4, 5, None), QuotaDelta::new(-3, 2)), 28);
    assert_eq!(projected_strings(&project(i64::MAX, 2, None), QuotaDelta::terms(1)), i64::MAX);
}

#[test]
fn sqlite_import_drops_locale_delta_for_counted_locales() {
    let counted = project(3, 2, Some(1_000));
    let delta = QuotaDelta::new(4, 1);
    assert_eq!(
        adjusted_delta(Dialect::Sqlite, ProjectAction::ImportTranslation, delta, &counted),
        QuotaDelta::terms(4)
    );
}

#[test]
fn import_correction_is_narrow() {
    let counted = project(3, 2, Some(1_000));
    let delta = QuotaDelta::new(4, 1);
    for dialect in [Dialect::Postgres, Dialect::Mysql] {
        assert_eq!(adjusted_delta(dialect, ProjectAction::ImportTranslation, delta, &counted), delta);
    }
    assert_eq!(adjusted_delta(Dialect::Sqlite, ProjectAction::AddTranslation, delta, &counted), delta);
    let empty = project(0, 0, Some(1_000));
    assert_eq!(adjusted_delta(Dialect::Sqlite, ProjectAction::ImportTranslation, delta, &empty), delta);
    let locale_only = QuotaDelta::locales(1);
    assert_eq!(
        adjusted_delta(Dialect::Sqlite, ProjectAction::ImportTranslation, locale_only, &counted),
        locale_only
    );
}

#[test]
fn status_hints_follow_http_conventions() {
    let cases = [
        (AuthzError::Unauthenticated("x".to_string()), 401),
        (AuthzError::Forbidden("x".to_string()), 403),
        (AuthzError::NotFound, 404),
        (
            AuthzError::QuotaExceeded {
                projected: 2,
                limit: 1,
            },
            402,
        ),
        (AuthzError::Storage("x".to_string()), 500),
    ];
    for (err, status) in cases {
        assert_eq!(err.status_hint(), status, "{err}");
    }
}
