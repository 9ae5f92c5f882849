// polyglot-migrate/src/lib.rs
// ============================================================================
// Module: Polyglot Migrate Library
// Description: Versioned schema migrations over any supported dialect.
// Purpose: Apply, revert, and report the schema history with a ledger.
// Dependencies: polyglot-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! The [`Migrator`] walks a [`MigrationCatalog`] of [`MigrationUnit`]s in
//! version order. Each unit runs in its own transaction and is recorded in
//! the `migration_ledger` table before commit, so a rerun applies nothing
//! twice. `SQLite` changes that `ALTER TABLE` cannot express go through
//! [`ShadowRebuild`], which copies the table into a new shape and restores
//! its indexes and foreign-key triggers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod engine;
pub mod ledger;
pub mod migrations;
pub mod rebuild;
pub mod unit;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::MigrationCatalog;
pub use engine::MigrationError;
pub use engine::MigrationReport;
pub use engine::Migrator;
pub use engine::UnitStatus;
pub use engine::UnitSummary;
pub use engine::run_pending_migrations;
pub use ledger::LEDGER_TABLE;
pub use ledger::LedgerEntry;
pub use rebuild::ColumnMapping;
pub use rebuild::RebuildSummary;
pub use rebuild::ShadowRebuild;
pub use unit::InvalidTransition;
pub use unit::MigrationContext;
pub use unit::MigrationUnit;
pub use unit::MigrationVersion;
pub use unit::Reversibility;
pub use unit::StepError;
pub use unit::UnitState;
