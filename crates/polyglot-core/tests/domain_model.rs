// polyglot-core/tests/domain_model.rs
// ============================================================================
// Module: Domain Model Tests
// Description: Role permissions, action labels, and wire forms of principals.
// Purpose: Pin the role hierarchy and the serialized shapes other layers read.
// Dependencies: polyglot-core, serde_json
// ============================================================================

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

use std::collections::BTreeSet;

use polyglot_core::ClientId;
use polyglot_core::Principal;
use polyglot_core::PrincipalKind;
use polyglot_core::ProjectAction;
use polyglot_core::Role;
use polyglot_core::UserId;
use serde_json::json;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn role_permissions_are_nested() {
    let actions = |role: Role| role.permitted_actions().iter().copied().collect::<BTreeSet<_>>();
    let viewer = actions(Role::Viewer);
    let editor = actions(Role::Editor);
    let admin = actions(Role::Admin);
    assert!(viewer.is_subset(&editor));
    assert!(editor.is_subset(&admin));
    assert_eq!(admin.len(), ProjectAction::ALL.len());
    assert!(!editor.contains(&ProjectAction::DeleteProject));
    assert!(!viewer.contains(&ProjectAction::AddTerm));
    assert!(editor.contains(&ProjectAction::ImportTranslation));
}

#[test]
fn only_content_additions_are_quota_gated() {
    let gated: Vec<ProjectAction> =
        ProjectAction::ALL.into_iter().filter(|action| action.is_quota_gated()).collect();
    assert_eq!(gated, vec![
        ProjectAction::AddTerm,
        ProjectAction::AddTranslation,
        ProjectAction::ImportTranslation,
    ]);
}

#[test]
fn action_labels_match_serde_names() {
    for action in ProjectAction::ALL {
        assert_eq!(serde_json::to_value(action).unwrap(), json!(action.as_str()));
    }
}

#[test]
fn roles_parse_only_stored_values() {
    for (role, stored) in Role::ALL.into_iter().zip(Role::STORED_VALUES) {
        assert_eq!(Role::parse(stored), Some(role));
        assert_eq!(role.to_string(), stored);
    }
    assert_eq!(Role::parse("Admin"), None);
    assert_eq!(Role::parse("owner"), None);
}

#[test]
fn principals_serialize_with_kind_tags() {
    let user = Principal::User(UserId::new("u-1"));
    let client = Principal::ProjectClient(ClientId::new("c-1"));
    assert_eq!(serde_json::to_value(&user).unwrap(), json!({"kind": "user", "id": "u-1"}));
    assert_eq!(
        serde_json::to_value(&client).unwrap(),
        json!({"kind": "project_client", "id": "c-1"})
    );
    assert_eq!(client.kind(), PrincipalKind::ProjectClient);
    assert_eq!(client.id_str(), "c-1");
    let parsed: Principal = serde_json::from_value(json!({"kind": "user", "id": "u-1"})).unwrap();
    assert_eq!(parsed, user);
}
