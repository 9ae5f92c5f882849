// polyglot-config/src/lib.rs
// ============================================================================
// Module: Polyglot Config Library
// Description: Configuration loading for the Polyglot workspace.
// Purpose: Expose the config model and validation entry points.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Loads `polyglot.toml`, resolves the database selector into a
//! [`polyglot_core::Dialect`], and produces the store configuration the
//! binaries connect with. Invalid input fails closed.

pub mod config;

pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DB_TYPE_ENV_VAR;
pub use config::DatabaseConfig;
pub use config::MigrationsConfig;
pub use config::PolyglotConfig;
