// polyglot-migrate/src/engine.rs
// ============================================================================
// Module: Migration Engine
// Description: Applies, reverts and reports migration units against a ledger.
// Purpose: Bring the schema to the newest version atomically, one unit at a time.
// Dependencies: polyglot-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`Migrator`] applies every unit above the ledger's high-water mark in
//! ascending order. Each unit runs in its own transaction together with its
//! ledger row, so a failure leaves the unit pending and the schema as it was
//! before the unit started. Reruns against an up-to-date ledger do nothing.
//!
//! Security posture: the migrator is the only writer of schema objects and
//! refuses to run when the ledger disagrees with the catalog.
//!
//! On `SQLite` the engine turns foreign-key enforcement off around each
//! unit (the pragma is ignored inside a transaction), checks
//! `PRAGMA foreign_key_check` before committing, and always turns
//! enforcement back on. Rich dialects serialize concurrent runners with the
//! strategy's startup lock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use polyglot_core::Dialect;
use polyglot_core::DialectStrategy;
use polyglot_core::ExecutorError;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlValue;
use polyglot_core::with_transaction;
use thiserror::Error;

use crate::catalog::MigrationCatalog;
use crate::ledger;
use crate::ledger::LedgerEntry;
use crate::unit::InvalidTransition;
use crate::unit::MigrationContext;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;
use crate::unit::Reversibility;
use crate::unit::StepError;
use crate::unit::UnitState;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Migration failures. All are fatal to process startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// Catalog versions are not strictly ascending.
    #[error("invalid migration catalog: {0}")]
    Catalog(String),
    /// The ledger does not match the catalog.
    #[error("migration ledger mismatch: {0}")]
    LedgerMismatch(String),
    /// A unit failed and was rolled back.
    #[error("migration {version} ({label}) failed: {message}")]
    UnitFailed {
        /// Failing unit's version.
        version: MigrationVersion,
        /// Failing unit's label.
        label: String,
        /// Underlying failure.
        message: String,
    },
    /// The startup lock could not be taken or released.
    #[error("migration lock error: {0}")]
    Lock(String),
    /// Storage failed outside a unit.
    #[error("migration storage error: {0}")]
    Storage(String),
    /// Strategy and executor disagree about the engine.
    #[error("migration strategy is {strategy} but the executor is {executor}")]
    DialectMismatch {
        /// Strategy dialect.
        strategy: Dialect,
        /// Executor dialect.
        executor: Dialect,
    },
    /// A unit state machine was driven illegally.
    #[error(transparent)]
    State(#[from] InvalidTransition),
}

impl From<ExecutorError> for MigrationError {
    fn from(err: ExecutorError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl MigrationError {
    /// Returns true when retrying the whole run may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Lock(_))
    }

    /// Attributes a failure to `unit`, keeping an existing attribution.
    fn attribute(self, unit: &dyn MigrationUnit) -> Self {
        match self {
            Self::UnitFailed {
                ..
            } => self,
            other => Self::UnitFailed {
                version: unit.version(),
                label: unit.label().to_string(),
                message: other.to_string(),
            },
        }
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Version and label of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    /// Unit version.
    pub version: MigrationVersion,
    /// Unit label.
    pub label: String,
}

/// Result of a run or revert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Units applied, ascending.
    pub applied: Vec<UnitSummary>,
    /// Units reverted, descending.
    pub reverted: Vec<UnitSummary>,
    /// High-water mark before the run.
    pub previous_version: i64,
    /// High-water mark after the run.
    pub current_version: i64,
}

impl MigrationReport {
    /// Returns true when nothing changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.reverted.is_empty()
    }
}

/// Status of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitStatus {
    /// Unit version.
    pub version: MigrationVersion,
    /// Unit label.
    pub label: String,
    /// Terminal state.
    pub state: UnitState,
    /// Apply time in unix milliseconds.
    pub applied_at_ms: Option<i64>,
    /// Reversibility on the active dialect.
    pub reversibility: Reversibility,
}

// ============================================================================
// SECTION: Migrator
// ============================================================================

/// Applies a catalog through one dialect strategy.
#[derive(Clone)]
pub struct Migrator {
    /// Units to apply.
    catalog: MigrationCatalog,
    /// Strategy of the active dialect.
    strategy: Arc<dyn DialectStrategy>,
}

impl Migrator {
    /// Creates a migrator.
    #[must_use]
    pub fn new(catalog: MigrationCatalog, strategy: Arc<dyn DialectStrategy>) -> Self {
        Self {
            catalog,
            strategy,
        }
    }

    /// Creates a migrator over the built-in schema history.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Catalog`] if the built-in list is misordered.
    pub fn standard(strategy: Arc<dyn DialectStrategy>) -> Result<Self, MigrationError> {
        Ok(Self::new(MigrationCatalog::standard()?, strategy))
    }

    /// Returns the catalog.
    #[must_use]
    pub const fn catalog(&self) -> &MigrationCatalog {
        &self.catalog
    }

    /// Applies every pending unit in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] on a ledger mismatch, lock failure, or the
    /// first failing unit. Units applied before the failure stay applied.
    pub fn run_pending(
        &self,
        executor: &mut dyn SqlExecutor,
    ) -> Result<MigrationReport, MigrationError> {
        self.ensure_dialect(executor)?;
        self.with_lock(executor, |executor| {
            let entries = ledger::read_entries(executor, self.strategy.as_ref())?;
            self.check_ledger(&entries)?;
            let previous_version = ledger::high_water_mark(&entries);
            let mut report = MigrationReport {
                previous_version,
                current_version: previous_version,
                ..MigrationReport::default()
            };
            for unit in self.catalog.units() {
                if unit.version().as_i64() <= previous_version {
                    continue;
                }
                if self.apply_unit(executor, unit.as_ref())? {
                    report.current_version = unit.version().as_i64();
                    report.applied.push(summary(unit.as_ref()));
                }
            }
            if report.applied.is_empty() {
                tracing::info!(version = previous_version, "schema up to date");
            }
            Ok(report)
        })
    }

    /// Reverts the newest `steps` applied units in descending order.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] on a ledger mismatch, lock failure, or the
    /// first failing unit.
    pub fn revert(
        &self,
        executor: &mut dyn SqlExecutor,
        steps: usize,
    ) -> Result<MigrationReport, MigrationError> {
        self.ensure_dialect(executor)?;
        self.with_lock(executor, |executor| {
            let entries = ledger::read_entries(executor, self.strategy.as_ref())?;
            self.check_ledger(&entries)?;
            let previous_version = ledger::high_water_mark(&entries);
            let mut report = MigrationReport {
                previous_version,
                current_version: previous_version,
                ..MigrationReport::default()
            };
            for entry in entries.iter().rev().take(steps) {
                let Some(unit) = self.catalog.get(entry.version) else {
                    return Err(unknown_version(entry.version));
                };
                if self.revert_unit(executor, unit.as_ref())? {
                    report.reverted.push(summary(unit.as_ref()));
                }
            }
            report.current_version =
                ledger::high_water_mark(&ledger::read_entries(executor, self.strategy.as_ref())?);
            Ok(report)
        })
    }

    /// Reports every unit's terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Storage`] when the ledger cannot be read.
    pub fn status(&self, executor: &mut dyn SqlExecutor) -> Result<Vec<UnitStatus>, MigrationError> {
        self.ensure_dialect(executor)?;
        let entries = ledger::read_entries(executor, self.strategy.as_ref())?;
        let dialect = self.strategy.dialect();
        Ok(self
            .catalog
            .units()
            .iter()
            .map(|unit| {
                let entry = entries.iter().find(|entry| entry.version == unit.version().as_i64());
                UnitStatus {
                    version: unit.version(),
                    label: unit.label().to_string(),
                    state: if entry.is_some() { UnitState::Applied } else { UnitState::Pending },
                    applied_at_ms: entry.map(|entry| entry.applied_at_ms),
                    reversibility: unit.reversibility(dialect),
                }
            })
            .collect())
    }

    /// Applies one unit; returns false when another runner already applied it.
    fn apply_unit(
        &self,
        executor: &mut dyn SqlExecutor,
        unit: &dyn MigrationUnit,
    ) -> Result<bool, MigrationError> {
        let span = tracing::info_span!(
            "migration_unit",
            version = %unit.version(),
            label = unit.label(),
            state = %UnitState::Applying
        );
        let _entered = span.enter();
        let state = UnitState::Pending.transition(UnitState::Applying)?;
        let strategy = self.strategy.as_ref();
        let outcome = self.with_foreign_keys_disabled(executor, |executor| {
            with_transaction(executor, |tx| {
                if ledger::is_recorded(tx, strategy, unit.version())? {
                    return Ok(false);
                }
                let mut ctx = MigrationContext::new(&mut *tx, strategy);
                unit.up(&mut ctx).map_err(|err| step_failure(unit, &err))?;
                self.verify_foreign_keys(tx)?;
                ledger::record(tx, strategy, unit.version(), unit.label())?;
                Ok(true)
            })
        });
        match outcome {
            Ok(applied) => {
                state.transition(UnitState::Applied)?;
                if applied {
                    tracing::info!(version = %unit.version(), label = unit.label(), "migration applied");
                } else {
                    tracing::info!(
                        version = %unit.version(),
                        label = unit.label(),
                        "migration already applied by another runner"
                    );
                }
                Ok(applied)
            }
            Err(err) => {
                state.transition(UnitState::Pending)?;
                let err = err.attribute(unit);
                tracing::error!(error = %err, "migration rolled back");
                Err(err)
            }
        }
    }

    /// Reverts one unit; returns false when its ledger row is already gone.
    fn revert_unit(
        &self,
        executor: &mut dyn SqlExecutor,
        unit: &dyn MigrationUnit,
    ) -> Result<bool, MigrationError> {
        let span = tracing::info_span!(
            "migration_unit",
            version = %unit.version(),
            label = unit.label(),
            state = %UnitState::Reverting
        );
        let _entered = span.enter();
        let state = UnitState::Applied.transition(UnitState::Reverting)?;
        let strategy = self.strategy.as_ref();
        let reversibility = unit.reversibility(strategy.dialect());
        let outcome = self.with_foreign_keys_disabled(executor, |executor| {
            with_transaction(executor, |tx| {
                if !ledger::is_recorded(tx, strategy, unit.version())? {
                    return Ok(false);
                }
                ledger::remove(tx, strategy, unit.version())?;
                if reversibility == Reversibility::Irreversible {
                    tracing::warn!(
                        version = %unit.version(),
                        label = unit.label(),
                        dialect = %strategy.dialect(),
                        "migration cannot be reverted; removing ledger row only"
                    );
                    return Ok(true);
                }
                let mut ctx = MigrationContext::new(&mut *tx, strategy);
                unit.down(&mut ctx).map_err(|err| step_failure(unit, &err))?;
                self.verify_foreign_keys(tx)?;
                Ok(true)
            })
        });
        match outcome {
            Ok(reverted) => {
                state.transition(UnitState::Pending)?;
                if reverted {
                    tracing::info!(version = %unit.version(), label = unit.label(), "migration reverted");
                }
                Ok(reverted)
            }
            Err(err) => {
                state.transition(UnitState::Applied)?;
                let err = err.attribute(unit);
                tracing::error!(error = %err, "migration revert rolled back");
                Err(err)
            }
        }
    }

    /// Refuses an executor for a different engine.
    fn ensure_dialect(&self, executor: &dyn SqlExecutor) -> Result<(), MigrationError> {
        let strategy = self.strategy.dialect();
        let actual = executor.dialect();
        if strategy == actual {
            Ok(())
        } else {
            Err(MigrationError::DialectMismatch {
                strategy,
                executor: actual,
            })
        }
    }

    /// Requires the applied versions to be a prefix of the catalog.
    fn check_ledger(&self, entries: &[LedgerEntry]) -> Result<(), MigrationError> {
        for (position, entry) in entries.iter().enumerate() {
            let Some(unit) = self.catalog.get(entry.version) else {
                return Err(unknown_version(entry.version));
            };
            let expected = self.catalog.units().get(position).map(|unit| unit.version());
            if expected != Some(unit.version()) {
                return Err(MigrationError::LedgerMismatch(format!(
                    "version {} is applied but earlier versions are missing",
                    unit.version()
                )));
            }
        }
        Ok(())
    }

    /// Aborts when `SQLite` reports dangling references.
    fn verify_foreign_keys(&self, executor: &mut dyn SqlExecutor) -> Result<(), MigrationError> {
        if self.strategy.dialect() != Dialect::Sqlite {
            return Ok(());
        }
        let violations = executor.query("PRAGMA foreign_key_check", &[])?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(MigrationError::Storage(format!(
                "foreign key check found {} violation(s)",
                violations.len()
            )))
        }
    }

    /// Runs `work` with `SQLite` foreign-key enforcement off, restoring it afterwards.
    fn with_foreign_keys_disabled<T>(
        &self,
        executor: &mut dyn SqlExecutor,
        work: impl FnOnce(&mut dyn SqlExecutor) -> Result<T, MigrationError>,
    ) -> Result<T, MigrationError> {
        if self.strategy.dialect() != Dialect::Sqlite {
            return work(executor);
        }
        executor.execute("PRAGMA foreign_keys = OFF", &[])?;
        let outcome = work(&mut *executor);
        let restored = executor.execute("PRAGMA foreign_keys = ON", &[]);
        match (outcome, restored) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), restored) => {
                if let Err(restore_err) = restored {
                    tracing::warn!(error = %restore_err, "failed to re-enable foreign keys");
                }
                Err(err)
            }
        }
    }

    /// Holds the strategy's startup lock around `work`.
    fn with_lock<T>(
        &self,
        executor: &mut dyn SqlExecutor,
        work: impl FnOnce(&mut dyn SqlExecutor) -> Result<T, MigrationError>,
    ) -> Result<T, MigrationError> {
        let Some(lock) = self.strategy.migration_lock() else {
            return work(executor);
        };
        let rows =
            executor.query(&lock.acquire, &[]).map_err(|err| MigrationError::Lock(err.to_string()))?;
        if lock.confirms {
            let granted = rows.first().and_then(|row| row.first()).and_then(SqlValue::as_i64);
            if granted != Some(1) {
                return Err(MigrationError::Lock("migration lock not granted".to_string()));
            }
        }
        let outcome = work(&mut *executor);
        if let Err(err) = executor.query(&lock.release, &[]) {
            tracing::warn!(error = %err, "failed to release migration lock");
        }
        outcome
    }
}

// ============================================================================
// SECTION: Bootstrap
// ============================================================================

/// Applies the built-in schema history; the one-call startup entry.
///
/// # Errors
///
/// Returns [`MigrationError`] on any failure; callers must not serve traffic.
pub fn run_pending_migrations(
    executor: &mut dyn SqlExecutor,
    strategy: Arc<dyn DialectStrategy>,
) -> Result<MigrationReport, MigrationError> {
    Migrator::standard(strategy)?.run_pending(executor)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a unit summary.
fn summary(unit: &dyn MigrationUnit) -> UnitSummary {
    UnitSummary {
        version: unit.version(),
        label: unit.label().to_string(),
    }
}

/// Builds the unknown-version mismatch error.
fn unknown_version(version: i64) -> MigrationError {
    MigrationError::LedgerMismatch(format!("ledger names unknown version {version}"))
}

/// Wraps a unit's step failure.
fn step_failure(unit: &dyn MigrationUnit, err: &StepError) -> MigrationError {
    MigrationError::UnitFailed {
        version: unit.version(),
        label: unit.label().to_string(),
        message: err.to_string(),
    }
}
