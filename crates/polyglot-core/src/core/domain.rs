// polyglot-core/src/core/domain.rs
// ============================================================================
// Module: Polyglot Domain Records
// Description: Roles, project actions, plans, projects, principals, memberships.
// Purpose: Define the authorization vocabulary independent of any dialect.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Roles are ordered capability levels: every action an Editor may perform is
//! also permitted to an Admin, and every Viewer action is permitted to an
//! Editor. Projects carry the two running counters that feed the quota check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ClientId;
use crate::core::identifiers::PlanCode;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Action a principal may attempt against a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectAction {
    /// Read project metadata.
    ViewProject,
    /// Rename or describe the project.
    EditProject,
    /// Delete the project.
    DeleteProject,
    /// List project members.
    ViewProjectUser,
    /// Add a member.
    AddProjectUser,
    /// Change a member's role.
    EditProjectUser,
    /// Remove a member.
    DeleteProjectUser,
    /// List pending invites.
    ViewProjectInvite,
    /// Invite a user by email.
    InviteUser,
    /// Change an invite.
    EditProjectInvite,
    /// Revoke an invite.
    DeleteProjectInvite,
    /// List API clients.
    ViewProjectClient,
    /// Create an API client.
    AddProjectClient,
    /// Change an API client.
    EditProjectClient,
    /// Delete an API client.
    DeleteProjectClient,
    /// Read terms.
    ViewTerm,
    /// Create terms.
    AddTerm,
    /// Change terms.
    EditTerm,
    /// Delete terms.
    DeleteTerm,
    /// Read translations.
    ViewTranslation,
    /// Add a locale with translations.
    AddTranslation,
    /// Change translations.
    EditTranslation,
    /// Delete translations.
    DeleteTranslation,
    /// Import a translation file.
    ImportTranslation,
    /// Export translations.
    ExportTranslation,
    /// Read labels.
    ViewLabel,
    /// Create labels.
    AddLabel,
    /// Change labels or their assignments.
    EditLabel,
    /// Delete labels.
    DeleteLabel,
    /// Read the project's plan.
    ViewProjectPlan,
}

/// Actions a Viewer may perform.
const VIEWER_ACTIONS: &[ProjectAction] = &[
    ProjectAction::ViewProject,
    ProjectAction::ViewTerm,
    ProjectAction::ViewTranslation,
    ProjectAction::ExportTranslation,
    ProjectAction::ViewLabel,
    ProjectAction::ViewProjectPlan,
];

/// Actions an Editor may perform.
const EDITOR_ACTIONS: &[ProjectAction] = &[
    ProjectAction::ViewProject,
    ProjectAction::ViewTerm,
    ProjectAction::AddTerm,
    ProjectAction::EditTerm,
    ProjectAction::DeleteTerm,
    ProjectAction::ViewTranslation,
    ProjectAction::AddTranslation,
    ProjectAction::EditTranslation,
    ProjectAction::DeleteTranslation,
    ProjectAction::ImportTranslation,
    ProjectAction::ExportTranslation,
    ProjectAction::ViewLabel,
    ProjectAction::AddLabel,
    ProjectAction::EditLabel,
    ProjectAction::DeleteLabel,
    ProjectAction::ViewProjectPlan,
];

impl ProjectAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 30] = [
        Self::ViewProject,
        Self::EditProject,
        Self::DeleteProject,
        Self::ViewProjectUser,
        Self::AddProjectUser,
        Self::EditProjectUser,
        Self::DeleteProjectUser,
        Self::ViewProjectInvite,
        Self::InviteUser,
        Self::EditProjectInvite,
        Self::DeleteProjectInvite,
        Self::ViewProjectClient,
        Self::AddProjectClient,
        Self::EditProjectClient,
        Self::DeleteProjectClient,
        Self::ViewTerm,
        Self::AddTerm,
        Self::EditTerm,
        Self::DeleteTerm,
        Self::ViewTranslation,
        Self::AddTranslation,
        Self::EditTranslation,
        Self::DeleteTranslation,
        Self::ImportTranslation,
        Self::ExportTranslation,
        Self::ViewLabel,
        Self::AddLabel,
        Self::EditLabel,
        Self::DeleteLabel,
        Self::ViewProjectPlan,
    ];

    /// Returns true when the action is subject to the string quota.
    #[must_use]
    pub const fn is_quota_gated(self) -> bool {
        matches!(self, Self::AddTerm | Self::AddTranslation | Self::ImportTranslation)
    }

    /// Returns the stable snake_case label used in audit records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewProject => "view_project",
            Self::EditProject => "edit_project",
            Self::DeleteProject => "delete_project",
            Self::ViewProjectUser => "view_project_user",
            Self::AddProjectUser => "add_project_user",
            Self::EditProjectUser => "edit_project_user",
            Self::DeleteProjectUser => "delete_project_user",
            Self::ViewProjectInvite => "view_project_invite",
            Self::InviteUser => "invite_user",
            Self::EditProjectInvite => "edit_project_invite",
            Self::DeleteProjectInvite => "delete_project_invite",
            Self::ViewProjectClient => "view_project_client",
            Self::AddProjectClient => "add_project_client",
            Self::EditProjectClient => "edit_project_client",
            Self::DeleteProjectClient => "delete_project_client",
            Self::ViewTerm => "view_term",
            Self::AddTerm => "add_term",
            Self::EditTerm => "edit_term",
            Self::DeleteTerm => "delete_term",
            Self::ViewTranslation => "view_translation",
            Self::AddTranslation => "add_translation",
            Self::EditTranslation => "edit_translation",
            Self::DeleteTranslation => "delete_translation",
            Self::ImportTranslation => "import_translation",
            Self::ExportTranslation => "export_translation",
            Self::ViewLabel => "view_label",
            Self::AddLabel => "add_label",
            Self::EditLabel => "edit_label",
            Self::DeleteLabel => "delete_label",
            Self::ViewProjectPlan => "view_project_plan",
        }
    }
}

impl fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Capability level of a principal on a project.
///
/// # Invariants
/// - `permitted_actions(Viewer) ⊆ permitted_actions(Editor) ⊆ permitted_actions(Admin)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control, including membership and client management.
    Admin,
    /// Content editing.
    Editor,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Every role, strongest first.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Editor, Self::Viewer];

    /// Stored string values, in the order the enum columns declare them.
    pub const STORED_VALUES: [&'static str; 3] = ["admin", "editor", "viewer"];

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Parses a stored role value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    /// Returns the actions the role may perform.
    #[must_use]
    pub fn permitted_actions(self) -> &'static [ProjectAction] {
        match self {
            Self::Admin => &ProjectAction::ALL,
            Self::Editor => EDITOR_ACTIONS,
            Self::Viewer => VIEWER_ACTIONS,
        }
    }

    /// Returns true when the role may perform `action`.
    #[must_use]
    pub fn permits(self, action: ProjectAction) -> bool {
        self.permitted_actions().contains(&action)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a project invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// Invite email sent, not yet accepted.
    Sent,
    /// Invite accepted; a membership exists.
    Accepted,
}

impl InviteStatus {
    /// Stored string values, in the order the enum columns declare them.
    pub const STORED_VALUES: [&'static str; 2] = ["sent", "accepted"];

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Accepted => "accepted",
        }
    }
}

// ============================================================================
// SECTION: Projects and Plans
// ============================================================================

/// Subscription plan bounding a project's string count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan code.
    pub code: PlanCode,
    /// Display name.
    pub name: String,
    /// Upper bound on `locales_count * terms_count`.
    pub max_strings: i64,
}

/// Project with its quota counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Number of terms currently recorded.
    pub terms_count: i64,
    /// Number of locales currently recorded.
    pub locales_count: i64,
    /// Attached plan; `None` after the plan row was deleted.
    pub plan: Option<Plan>,
}

// ============================================================================
// SECTION: Principals
// ============================================================================

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Principal {
    /// Human user.
    User(UserId),
    /// Project API client credential.
    ProjectClient(ClientId),
}

/// Principal kind label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// Human user.
    User,
    /// Project API client.
    ProjectClient,
}

impl Principal {
    /// Returns the principal kind.
    #[must_use]
    pub const fn kind(&self) -> PrincipalKind {
        match self {
            Self::User(_) => PrincipalKind::User,
            Self::ProjectClient(_) => PrincipalKind::ProjectClient,
        }
    }

    /// Returns the raw identifier string.
    #[must_use]
    pub fn id_str(&self) -> &str {
        match self {
            Self::User(id) => id.as_str(),
            Self::ProjectClient(id) => id.as_str(),
        }
    }
}

/// Resolved association between a principal and a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The principal.
    pub principal: Principal,
    /// Role the principal holds on the project.
    pub role: Role,
    /// Joined project, including its plan.
    pub project: Project,
}
