// polyglot-authz/src/context.rs
// ============================================================================
// Module: Request Context
// Description: Caller identity attached to an incoming request.
// Purpose: Carry the authenticated principal into authorization checks.
// Dependencies: polyglot-core
// ============================================================================

//! ## Overview
//! Authentication happens outside this crate. The route layer attaches the
//! resulting [`Principal`] (or nothing) to a [`RequestContext`], and each
//! capability declares whether API clients may use it through a
//! [`PrincipalRequirement`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_core::Principal;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context used for authorization decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Authenticated caller, if any.
    pub principal: Option<Principal>,
    /// Optional request identifier for auditing.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds a context with no authenticated caller.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a context for `principal`.
    #[must_use]
    pub fn for_principal(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Kind of caller a capability accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrincipalRequirement {
    /// Users and project API clients.
    #[default]
    AnyPrincipal,
    /// Users only.
    HumanUser,
}

impl PrincipalRequirement {
    /// Returns true when `principal` satisfies the requirement.
    #[must_use]
    pub const fn admits(self, principal: &Principal) -> bool {
        match self {
            Self::AnyPrincipal => true,
            Self::HumanUser => matches!(principal, Principal::User(_)),
        }
    }
}
