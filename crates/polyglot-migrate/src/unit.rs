// polyglot-migrate/src/unit.rs
// ============================================================================
// Module: Migration Units
// Description: Versioned schema change contract and its execution context.
// Purpose: Give every unit the executor and the injected dialect strategy.
// Dependencies: polyglot-core, thiserror
// ============================================================================

//! ## Overview
//! A [`MigrationUnit`] is one versioned, atomic schema change with a forward
//! and a reverse action. Units never consult a global dialect flag: the
//! [`MigrationContext`] hands them the strategy chosen at startup along with
//! the executor whose transaction they run in.
//!
//! [`UnitState`] tracks the lifecycle of one unit inside a run. Only
//! `Pending` and `Applied` are resting states; the transitional states exist
//! for the duration of a transaction and collapse back on rollback.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use polyglot_core::DdlError;
use polyglot_core::Dialect;
use polyglot_core::DialectStrategy;
use polyglot_core::ExecutorError;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlRow;
use polyglot_core::SqlValue;
use thiserror::Error;

// ============================================================================
// SECTION: Versions
// ============================================================================

/// Strictly increasing migration version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationVersion(u32);

impl MigrationVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the version as stored in the ledger.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Whether a unit's reverse action restores the prior schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reversibility {
    /// `down` restores the prior schema.
    Reversible,
    /// `down` cannot restore the prior schema; reverting only removes the ledger row.
    Irreversible,
}

// ============================================================================
// SECTION: Step Errors
// ============================================================================

/// Failure raised inside a unit's forward or reverse action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// Statement failed.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    /// DDL the dialect cannot express.
    #[error(transparent)]
    Ddl(#[from] DdlError),
    /// The database is not in the shape the unit expects.
    #[error("unexpected schema state: {0}")]
    Schema(String),
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Executor and strategy handed to a unit for the duration of its transaction.
pub struct MigrationContext<'a> {
    /// Executor inside the unit's transaction.
    executor: &'a mut dyn SqlExecutor,
    /// Strategy of the active dialect.
    strategy: &'a dyn DialectStrategy,
}

impl<'a> MigrationContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(executor: &'a mut dyn SqlExecutor, strategy: &'a dyn DialectStrategy) -> Self {
        Self {
            executor,
            strategy,
        }
    }

    /// Returns the active strategy.
    #[must_use]
    pub const fn strategy(&self) -> &'a dyn DialectStrategy {
        self.strategy
    }

    /// Returns the active dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.strategy.dialect()
    }

    /// Returns the executor.
    pub fn executor(&mut self) -> &mut dyn SqlExecutor {
        &mut *self.executor
    }

    /// Executes one statement without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Executor`] when the statement fails.
    pub fn execute(&mut self, sql: &str) -> Result<(), StepError> {
        self.executor.execute(sql, &[])?;
        Ok(())
    }

    /// Executes one statement with positional parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Executor`] when the statement fails.
    pub fn execute_with(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, StepError> {
        Ok(self.executor.execute(sql, params)?)
    }

    /// Executes statements in order.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Executor`] on the first failing statement.
    pub fn execute_all<I>(&mut self, statements: I) -> Result<(), StepError>
    where
        I: IntoIterator<Item = String>,
    {
        for statement in statements {
            self.execute(&statement)?;
        }
        Ok(())
    }

    /// Runs a query.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Executor`] when the query fails.
    pub fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, StepError> {
        Ok(self.executor.query(sql, params)?)
    }
}

// ============================================================================
// SECTION: Unit Contract
// ============================================================================

/// One versioned schema change.
pub trait MigrationUnit: Send + Sync {
    /// Returns the unit's version.
    fn version(&self) -> MigrationVersion;

    /// Returns a short kebab-case label.
    fn label(&self) -> &'static str;

    /// Returns whether `down` restores the prior schema on `dialect`.
    fn reversibility(&self, _dialect: Dialect) -> Reversibility {
        Reversibility::Reversible
    }

    /// Applies the change.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when a statement fails; the engine rolls back.
    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError>;

    /// Reverts the change.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when a statement fails; the engine rolls back.
    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<(), StepError>;
}

// ============================================================================
// SECTION: Unit State
// ============================================================================

/// Lifecycle state of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Not recorded in the ledger.
    Pending,
    /// Forward transaction open.
    Applying,
    /// Recorded in the ledger.
    Applied,
    /// Reverse transaction open.
    Reverting,
}

impl UnitState {
    /// Returns true for states a unit may rest in between runs.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Pending | Self::Applied)
    }

    /// Moves to `next` when the transition is legal.
    ///
    /// Rollback paths return a transitional state to where it started.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] for any other move.
    pub const fn transition(self, next: Self) -> Result<Self, InvalidTransition> {
        match (self, next) {
            (Self::Pending, Self::Applying)
            | (Self::Applying, Self::Applied | Self::Pending)
            | (Self::Applied, Self::Reverting)
            | (Self::Reverting, Self::Pending | Self::Applied) => Ok(next),
            _ => Err(InvalidTransition {
                from: self,
                to: next,
            }),
        }
    }

    /// Returns a lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applying => "applying",
            Self::Applied => "applied",
            Self::Reverting => "reverting",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Illegal unit state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal migration state transition {from} -> {to}")]
pub struct InvalidTransition {
    /// State before the attempted move.
    pub from: UnitState,
    /// Requested state.
    pub to: UnitState,
}
