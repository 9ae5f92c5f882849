// polyglot-authz/src/quota.rs
// ============================================================================
// Module: String Quota
// Description: Projected string count against the project's plan.
// Purpose: Reject writes that would grow a project past its plan limit.
// Dependencies: polyglot-core
// ============================================================================

//! ## Overview
//! A project's string count is `locales_count * terms_count`. Quota-gated
//! actions project that product after the requested increase and fail when it
//! exceeds the plan's `max_strings`; a product equal to the limit passes.
//!
//! On `SQLite` a chunked import authorizes the locale addition and the term
//! additions separately. The locale from the first call is already counted
//! by the time the second call arrives, so [`adjusted_delta`] drops the
//! second call's locale increase from the projection. The stored counters
//! are not corrected. No other dialect or action is adjusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_core::Dialect;
use polyglot_core::Project;
use polyglot_core::ProjectAction;

// ============================================================================
// SECTION: Delta
// ============================================================================

/// Requested change to a project's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaDelta {
    /// Change in term count; negative values decrement.
    pub terms: i64,
    /// Change in locale count; negative values decrement.
    pub locales: i64,
}

impl QuotaDelta {
    /// No change.
    pub const ZERO: Self = Self {
        terms: 0,
        locales: 0,
    };

    /// Builds a delta.
    #[must_use]
    pub const fn new(terms: i64, locales: i64) -> Self {
        Self {
            terms,
            locales,
        }
    }

    /// Builds a term-only delta.
    #[must_use]
    pub const fn terms(terms: i64) -> Self {
        Self::new(terms, 0)
    }

    /// Builds a locale-only delta.
    #[must_use]
    pub const fn locales(locales: i64) -> Self {
        Self::new(0, locales)
    }

    /// Returns true when neither counter changes.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.terms == 0 && self.locales == 0
    }
}

// ============================================================================
// SECTION: Check
// ============================================================================

/// Outcome of a failed quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaViolation {
    /// String count the write would produce.
    pub projected: i64,
    /// Plan limit; 0 when the project has no plan.
    pub limit: i64,
}

/// Returns the delta to check and record for `action` on `project`.
#[must_use]
pub fn adjusted_delta(
    dialect: Dialect,
    action: ProjectAction,
    delta: QuotaDelta,
    project: &Project,
) -> QuotaDelta {
    let already_counted = dialect == Dialect::Sqlite
        && action == ProjectAction::ImportTranslation
        && delta.terms > 0
        && delta.locales > 0
        && project.locales_count > 0;
    if already_counted {
        tracing::debug!(
            project = %project.id,
            locales_count = project.locales_count,
            "import locale already counted; ignoring locale delta"
        );
        QuotaDelta {
            locales: 0,
            ..delta
        }
    } else {
        delta
    }
}

/// Returns the string count after applying the increases in `delta`.
#[must_use]
pub fn projected_strings(project: &Project, delta: QuotaDelta) -> i64 {
    let locales = project.locales_count.saturating_add(delta.locales.max(0));
    let terms = project.terms_count.saturating_add(delta.terms.max(0));
    locales.saturating_mul(terms)
}

/// Checks `delta` against the plan of `project` for a quota-gated action.
///
/// # Errors
///
/// Returns [`QuotaViolation`] when the projection exceeds the plan limit or
/// the project has no plan.
pub fn check_quota(
    action: ProjectAction,
    project: &Project,
    delta: QuotaDelta,
) -> Result<(), QuotaViolation> {
    if !action.is_quota_gated() {
        return Ok(());
    }
    let projected = projected_strings(project, delta);
    match &project.plan {
        Some(plan) if projected <= plan.max_strings => Ok(()),
        Some(plan) => Err(QuotaViolation {
            projected,
            limit: plan.max_strings,
        }),
        None => Err(QuotaViolation {
            projected,
            limit: 0,
        }),
    }
}
