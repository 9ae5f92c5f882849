// polyglot-cli/src/bootstrap.rs
// ============================================================================
// Module: Startup Bootstrap
// Description: Turns a validated configuration into a running storage stack.
// Purpose: Install the dialect, open the database, migrate, and build authz.
// Dependencies: polyglot-authz, polyglot-config, polyglot-core,
//               polyglot-migrate, polyglot-store, thiserror, tracing
// ============================================================================

//! ## Overview
//! Startup order is fixed: the dialect is resolved and installed in the
//! registry first, then the database is opened, then pending migrations run
//! (unless `migrations.auto_migrate` is off), and only then is the
//! authorization service handed out. A failure at any step aborts startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use polyglot_authz::AuthorizationService;
use polyglot_authz::AuthzAuditSink;
use polyglot_authz::NoopAuditSink;
use polyglot_authz::StderrAuditSink;
use polyglot_config::AuditSinkKind;
use polyglot_config::ConfigError;
use polyglot_config::PolyglotConfig;
use polyglot_core::Dialect;
use polyglot_core::DialectRegistry;
use polyglot_core::DialectStrategy;
use polyglot_migrate::MigrationError;
use polyglot_migrate::MigrationReport;
use polyglot_migrate::Migrator;
use polyglot_store::SharedDatabase;
use polyglot_store::StoreError;
use polyglot_store::open_database;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The registry holds a different dialect.
    #[error("dialect registry error: {0}")]
    Registry(String),
    /// The database could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Migrations failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

// ============================================================================
// SECTION: Storage
// ============================================================================

/// Open database with the migrator for its dialect.
pub struct Storage {
    /// Active dialect.
    dialect: Dialect,
    /// Strategy of the active dialect.
    strategy: Arc<dyn DialectStrategy>,
    /// Database handle.
    database: SharedDatabase,
    /// Migrator over the built-in history.
    migrator: Migrator,
}

impl Storage {
    /// Returns the active dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the database handle.
    #[must_use]
    pub fn database(&self) -> SharedDatabase {
        Arc::clone(&self.database)
    }

    /// Returns the migrator.
    #[must_use]
    pub const fn migrator(&self) -> &Migrator {
        &self.migrator
    }

    /// Applies pending migrations on a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when no connection is available or a unit fails.
    pub fn migrate(&self) -> Result<MigrationReport, BootstrapError> {
        let mut executor = self.database.executor()?;
        Ok(self.migrator.run_pending(executor.as_mut())?)
    }
}

/// Installs the configured dialect and opens its database.
///
/// # Errors
///
/// Returns [`BootstrapError`] when the selector is unknown, a different
/// dialect is already installed, or the database cannot be opened.
pub fn open_storage(config: &PolyglotConfig) -> Result<Storage, BootstrapError> {
    let dialect = DialectRegistry::install(config.dialect()?)
        .map_err(|err| BootstrapError::Registry(err.to_string()))?;
    let strategy =
        DialectRegistry::strategy().map_err(|err| BootstrapError::Registry(err.to_string()))?;
    let database = open_database(&config.store_config()?)?;
    let migrator = Migrator::standard(Arc::clone(&strategy))?;
    tracing::info!(dialect = %dialect, "database opened");
    Ok(Storage {
        dialect,
        strategy,
        database,
        migrator,
    })
}

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Fully started storage stack.
pub struct Runtime {
    /// Open storage.
    storage: Storage,
    /// Authorization service bound to the active dialect.
    authz: AuthorizationService,
    /// Report of the startup migration run, when one ran.
    startup_migration: Option<MigrationReport>,
}

impl Runtime {
    /// Returns the open storage.
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Returns the authorization service.
    #[must_use]
    pub const fn authz(&self) -> &AuthorizationService {
        &self.authz
    }

    /// Returns the startup migration report.
    #[must_use]
    pub const fn startup_migration(&self) -> Option<&MigrationReport> {
        self.startup_migration.as_ref()
    }
}

/// Runs the full startup sequence.
///
/// # Errors
///
/// Returns [`BootstrapError`] from the first failing step.
pub fn bootstrap(config: &PolyglotConfig) -> Result<Runtime, BootstrapError> {
    let storage = open_storage(config)?;
    let startup_migration = if config.migrations.auto_migrate {
        Some(storage.migrate()?)
    } else {
        tracing::warn!("automatic migrations disabled; schema may be behind");
        None
    };
    let authz = AuthorizationService::new(Arc::clone(&storage.strategy), audit_sink(config.audit.sink));
    Ok(Runtime {
        storage,
        authz,
        startup_migration,
    })
}

/// Builds the configured audit sink.
#[must_use]
pub fn audit_sink(kind: AuditSinkKind) -> Arc<dyn AuthzAuditSink> {
    match kind {
        AuditSinkKind::Stderr => Arc::new(StderrAuditSink),
        AuditSinkKind::None => Arc::new(NoopAuditSink),
    }
}
