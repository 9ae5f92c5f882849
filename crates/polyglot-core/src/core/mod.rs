// polyglot-core/src/core/mod.rs
// ============================================================================
// Module: Polyglot Core Types
// Description: Identifiers, domain records, column descriptors, schema model.
// Purpose: Provide the dialect-neutral vocabulary shared by every crate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe projects, plans, principals and roles, the logical
//! column kinds understood by the column-type factory, and the table model
//! that dialect strategies render into DDL.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod columns;
pub mod domain;
pub mod identifiers;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use columns::CheckConstraint;
pub use columns::ColumnDefault;
pub use columns::ColumnKind;
pub use columns::ColumnOptions;
pub use columns::ColumnSpec;
pub use columns::DialectOverrides;
pub use columns::column_for;
pub use domain::InviteStatus;
pub use domain::Membership;
pub use domain::Plan;
pub use domain::Principal;
pub use domain::PrincipalKind;
pub use domain::Project;
pub use domain::ProjectAction;
pub use domain::Role;
pub use identifiers::ClientId;
pub use identifiers::PlanCode;
pub use identifiers::ProjectId;
pub use identifiers::UserId;
pub use schema::ColumnDef;
pub use schema::ForeignKeyDef;
pub use schema::IndexDef;
pub use schema::MysqlCollation;
pub use schema::ReferentialAction;
pub use schema::TableBuilder;
pub use schema::TableDef;
pub use schema::UniqueDef;
