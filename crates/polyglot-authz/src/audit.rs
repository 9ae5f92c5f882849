// polyglot-authz/src/audit.rs
// ============================================================================
// Module: Authorization Audit
// Description: Audit events and sinks for authorization decisions.
// Purpose: Record every allow and deny with the reason it was reached.
// Dependencies: serde, serde_json, polyglot-core
// ============================================================================

//! ## Overview
//! Each decision produces one [`AuthzAuditEvent`]. Events never carry
//! credentials, only the principal kind and the project the caller asked
//! for.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use polyglot_core::Principal;
use polyglot_core::PrincipalKind;
use polyglot_core::ProjectAction;
use polyglot_core::ProjectId;
use serde::Serialize;

use crate::service::AuthzError;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Authorization audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuthzAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// Requested action, when the decision concerned one.
    action: Option<&'static str>,
    /// Requested project, when the decision concerned one.
    project_id: Option<String>,
    /// Caller kind, when a principal was attached.
    principal_kind: Option<PrincipalKind>,
    /// Failure reason for deny events.
    reason: Option<String>,
    /// Request identifier, if provided.
    request_id: Option<String>,
}

impl AuthzAuditEvent {
    /// Builds an allow event for `action` on `project_id`.
    #[must_use]
    pub fn allowed(principal: &Principal, project_id: &ProjectId, action: ProjectAction) -> Self {
        Self {
            event: "project_authz",
            decision: "allow",
            action: Some(action.as_str()),
            project_id: Some(project_id.to_string()),
            principal_kind: Some(principal.kind()),
            reason: None,
            request_id: None,
        }
    }

    /// Builds a deny event for `action` on `project_id`.
    #[must_use]
    pub fn denied(
        principal: &Principal,
        project_id: &ProjectId,
        action: ProjectAction,
        error: &AuthzError,
    ) -> Self {
        Self {
            event: "project_authz",
            decision: "deny",
            action: Some(action.as_str()),
            project_id: Some(project_id.to_string()),
            principal_kind: Some(principal.kind()),
            reason: Some(error.to_string()),
            request_id: None,
        }
    }

    /// Builds a deny event for a request whose principal was rejected.
    #[must_use]
    pub fn principal_rejected(principal: Option<&Principal>, error: &AuthzError) -> Self {
        Self {
            event: "principal_resolution",
            decision: "deny",
            action: None,
            project_id: None,
            principal_kind: principal.map(Principal::kind),
            reason: Some(error.to_string()),
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `allow` or `deny`.
    #[must_use]
    pub const fn decision(&self) -> &'static str {
        self.decision
    }

    /// Returns the requested action label.
    #[must_use]
    pub const fn action(&self) -> Option<&'static str> {
        self.action
    }

    /// Returns the deny reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for authorization decisions.
pub trait AuthzAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AuthzAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuthzAuditSink for StderrAuditSink {
    fn record(&self, event: &AuthzAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuthzAuditSink for NoopAuditSink {
    fn record(&self, _event: &AuthzAuditEvent) {}
}
