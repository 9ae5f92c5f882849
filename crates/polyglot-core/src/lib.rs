// polyglot-core/src/lib.rs
// ============================================================================
// Module: Polyglot Core Library
// Description: Public API surface for the Polyglot portability core.
// Purpose: Expose dialect strategies, schema types, and the executor interface.
// Dependencies: crate::{core, dialect, interfaces}
// ============================================================================

//! ## Overview
//! Polyglot core lets one logical schema history and one authorization model
//! run against three relational engines. It defines the active [`Dialect`],
//! the [`DialectStrategy`] implementations that encapsulate every
//! engine-specific rule, the column-type factory, and the [`SqlExecutor`]
//! seam through which migrations and authorization reach storage.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod dialect;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use dialect::ConfigurationError;
pub use dialect::DdlError;
pub use dialect::Dialect;
pub use dialect::DialectRegistry;
pub use dialect::DialectStrategy;
pub use dialect::MigrationLockSql;
pub use dialect::MysqlDialect;
pub use dialect::PhysicalTypes;
pub use dialect::PostgresDialect;
pub use dialect::SqliteDialect;
pub use dialect::strategy_for;
pub use interfaces::ExecutorError;
pub use interfaces::SqlExecutor;
pub use interfaces::SqlRow;
pub use interfaces::SqlValue;
pub use interfaces::with_transaction;
