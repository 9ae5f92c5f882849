// polyglot-authz/src/service.rs
// ============================================================================
// Module: Authorization Service
// Description: Principal resolution, role gate and quota enforcement.
// Purpose: Decide whether a write may proceed and run it atomically.
// Dependencies: polyglot-core, thiserror, crate::{audit, membership, quota}
// ============================================================================

//! ## Overview
//! [`AuthorizationService::authorize`] resolves the caller's membership,
//! checks the role, and projects the string quota. A missing membership is
//! reported as [`AuthzError::NotFound`] so callers cannot probe for project
//! existence.
//!
//! [`AuthorizationService::authorize_and_write`] runs the same checks inside
//! one transaction that first locks the project row, then runs the caller's
//! write and records the counter change. The import correction only shifts
//! the quota projection; the stored counters always take the caller's
//! change. Two concurrent writes against a
//! nearly full plan therefore serialize on the row lock, and at most one of
//! them passes the check.
//!
//! Security posture: every path fails closed and records an audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use polyglot_core::DialectStrategy;
use polyglot_core::ExecutorError;
use polyglot_core::Membership;
use polyglot_core::Principal;
use polyglot_core::ProjectAction;
use polyglot_core::ProjectId;
use polyglot_core::SqlExecutor;
use polyglot_core::with_transaction;
use thiserror::Error;

use crate::audit::AuthzAuditEvent;
use crate::audit::AuthzAuditSink;
use crate::context::PrincipalRequirement;
use crate::context::RequestContext;
use crate::membership;
use crate::quota;
use crate::quota::QuotaDelta;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// No principal is attached to the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// The principal may not perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// No membership links the principal to the project.
    #[error("project not found")]
    NotFound,
    /// The write would exceed the plan's string limit.
    #[error("quota exceeded: {projected} strings requested, plan allows {limit}")]
    QuotaExceeded {
        /// String count the write would produce.
        projected: i64,
        /// Plan limit; 0 when the project has no plan.
        limit: i64,
    },
    /// Storage failed.
    #[error("authorization storage error: {0}")]
    Storage(String),
}

impl AuthzError {
    /// Returns the HTTP status a route layer should answer with.
    #[must_use]
    pub const fn status_hint(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound => 404,
            Self::QuotaExceeded {
                ..
            } => 402,
            Self::Storage(_) => 500,
        }
    }
}

impl From<ExecutorError> for AuthzError {
    fn from(err: ExecutorError) -> Self {
        Self::Storage(err.to_string())
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Role and quota gate for project writes.
#[derive(Clone)]
pub struct AuthorizationService {
    /// Strategy of the active dialect.
    strategy: Arc<dyn DialectStrategy>,
    /// Decision sink.
    audit: Arc<dyn AuthzAuditSink>,
}

impl AuthorizationService {
    /// Creates a service.
    #[must_use]
    pub fn new(strategy: Arc<dyn DialectStrategy>, audit: Arc<dyn AuthzAuditSink>) -> Self {
        Self {
            strategy,
            audit,
        }
    }

    /// Returns the principal attached to `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Unauthenticated`] when no principal is attached
    /// and [`AuthzError::Forbidden`] when an API client calls a capability
    /// reserved for users.
    pub fn resolve_principal(
        &self,
        ctx: &RequestContext,
        requirement: PrincipalRequirement,
    ) -> Result<Principal, AuthzError> {
        let outcome = match &ctx.principal {
            None => Err(AuthzError::Unauthenticated("no principal attached to request".to_string())),
            Some(principal) if !requirement.admits(principal) => {
                Err(AuthzError::Forbidden("capability requires a user principal".to_string()))
            }
            Some(principal) => Ok(principal.clone()),
        };
        if let Err(err) = &outcome {
            self.audit.record(
                &AuthzAuditEvent::principal_rejected(ctx.principal.as_ref(), err)
                    .with_request_id(ctx.request_id.clone()),
            );
        }
        outcome
    }

    /// Loads the membership of `principal` on `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::NotFound`] when no membership exists and
    /// [`AuthzError::Storage`] when the query fails.
    pub fn resolve_membership(
        &self,
        executor: &mut dyn SqlExecutor,
        principal: &Principal,
        project_id: &ProjectId,
    ) -> Result<Membership, AuthzError> {
        membership::load_membership(executor, self.strategy.as_ref(), principal, project_id)?
            .ok_or(AuthzError::NotFound)
    }

    /// Checks `action` without writing. The result may be stale by the time
    /// the caller writes; use [`Self::authorize_and_write`] for quota-gated
    /// writes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] when the membership is missing, the role does
    /// not permit the action, or the quota would be exceeded.
    pub fn authorize(
        &self,
        executor: &mut dyn SqlExecutor,
        principal: &Principal,
        project_id: &ProjectId,
        action: ProjectAction,
        delta: QuotaDelta,
    ) -> Result<Membership, AuthzError> {
        let outcome = self.evaluate(executor, principal, project_id, action, delta);
        self.record(principal, project_id, action, outcome.as_ref().err());
        outcome
    }

    /// Locks the project, checks `action`, runs `write`, and adds `delta` to
    /// the project counters in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] from the checks or from `write`; the
    /// transaction is rolled back and the counters are unchanged.
    pub fn authorize_and_write<T, F>(
        &self,
        executor: &mut dyn SqlExecutor,
        principal: &Principal,
        project_id: &ProjectId,
        action: ProjectAction,
        delta: QuotaDelta,
        write: F,
    ) -> Result<T, AuthzError>
    where
        F: FnOnce(&mut dyn SqlExecutor, &Membership) -> Result<T, AuthzError>,
    {
        self.authorize_and_write_counted(
            executor,
            principal,
            project_id,
            action,
            delta,
            |tx, membership| write(tx, membership).map(|value| (value, delta)),
        )
    }

    /// Like [`Self::authorize_and_write`], but `write` reports the counter
    /// change it actually made. `delta` only feeds the quota check.
    ///
    /// A chunked import declares the locale on every chunk while creating it
    /// once; the chunk that finds the locale already present reports a zero
    /// locale change here.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] from the checks or from `write`; the
    /// transaction is rolled back and the counters are unchanged.
    pub fn authorize_and_write_counted<T, F>(
        &self,
        executor: &mut dyn SqlExecutor,
        principal: &Principal,
        project_id: &ProjectId,
        action: ProjectAction,
        delta: QuotaDelta,
        write: F,
    ) -> Result<T, AuthzError>
    where
        F: FnOnce(&mut dyn SqlExecutor, &Membership) -> Result<(T, QuotaDelta), AuthzError>,
    {
        let strategy = self.strategy.as_ref();
        let outcome = with_transaction(executor, |tx| {
            if !membership::lock_project(tx, strategy, project_id)? {
                return Err(AuthzError::NotFound);
            }
            let membership = self.evaluate(tx, principal, project_id, action, delta)?;
            let (value, recorded) = write(tx, &membership)?;
            membership::apply_counters(tx, strategy, project_id, recorded)?;
            Ok(value)
        });
        self.record(principal, project_id, action, outcome.as_ref().err());
        outcome
    }

    /// Runs the membership, role and quota checks.
    fn evaluate(
        &self,
        executor: &mut dyn SqlExecutor,
        principal: &Principal,
        project_id: &ProjectId,
        action: ProjectAction,
        delta: QuotaDelta,
    ) -> Result<Membership, AuthzError> {
        let membership = self.resolve_membership(executor, principal, project_id)?;
        if !membership.role.permits(action) {
            return Err(AuthzError::Forbidden(format!(
                "role {} may not {}",
                membership.role,
                action.as_str()
            )));
        }
        let adjusted =
            quota::adjusted_delta(self.strategy.dialect(), action, delta, &membership.project);
        quota::check_quota(action, &membership.project, adjusted).map_err(|violation| {
            AuthzError::QuotaExceeded {
                projected: violation.projected,
                limit: violation.limit,
            }
        })?;
        Ok(membership)
    }

    /// Records the decision for `action`.
    fn record(
        &self,
        principal: &Principal,
        project_id: &ProjectId,
        action: ProjectAction,
        error: Option<&AuthzError>,
    ) {
        let event = match error {
            None => AuthzAuditEvent::allowed(principal, project_id, action),
            Some(err) => AuthzAuditEvent::denied(principal, project_id, action, err),
        };
        self.audit.record(&event);
    }
}
