// polyglot-authz/src/lib.rs
// ============================================================================
// Module: Polyglot Authz Library
// Description: Authorization and quota service for project writes.
// Purpose: Expose principal resolution, the role gate and the string quota.
// Dependencies: crate::{audit, context, membership, quota, service}
// ============================================================================

//! ## Overview
//! Every project write passes through [`AuthorizationService`]: the caller's
//! membership is loaded, the role is checked against the action, and
//! quota-gated actions are checked against the plan's string limit. The
//! check and the counter update share one transaction with the write.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod context;
pub mod membership;
pub mod quota;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuthzAuditEvent;
pub use audit::AuthzAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use context::PrincipalRequirement;
pub use context::RequestContext;
pub use quota::QuotaDelta;
pub use quota::QuotaViolation;
pub use service::AuthorizationService;
pub use service::AuthzError;
