// polyglot-migrate/src/catalog.rs
// ============================================================================
// Module: Migration Catalog
// Description: Ordered, validated set of migration units.
// Purpose: Guarantee units apply strictly by ascending version.
// Dependencies: crate::unit, crate::migrations
// ============================================================================

//! ## Overview
//! A [`MigrationCatalog`] owns the units the engine may apply. Construction
//! rejects duplicate or out-of-order versions, so every later step can rely
//! on index order matching version order.

use std::sync::Arc;

use crate::engine::MigrationError;
use crate::migrations;
use crate::unit::MigrationUnit;
use crate::unit::MigrationVersion;

/// Ordered migration units.
#[derive(Clone)]
pub struct MigrationCatalog {
    /// Units in ascending version order.
    units: Vec<Arc<dyn MigrationUnit>>,
}

impl MigrationCatalog {
    /// Validates and wraps `units`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Catalog`] when versions are not strictly
    /// ascending or a version is zero.
    pub fn new(units: Vec<Arc<dyn MigrationUnit>>) -> Result<Self, MigrationError> {
        let mut previous = MigrationVersion::new(0);
        for unit in &units {
            let version = unit.version();
            if version <= previous {
                return Err(MigrationError::Catalog(format!(
                    "unit {} ({}) is not above version {previous}",
                    version,
                    unit.label()
                )));
            }
            previous = version;
        }
        Ok(Self {
            units,
        })
    }

    /// Returns the built-in schema history.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Catalog`] if the built-in list is misordered.
    pub fn standard() -> Result<Self, MigrationError> {
        Self::new(migrations::standard_units())
    }

    /// Returns the units in ascending order.
    #[must_use]
    pub fn units(&self) -> &[Arc<dyn MigrationUnit>] {
        &self.units
    }

    /// Returns the unit with `version`.
    #[must_use]
    pub fn get(&self, version: i64) -> Option<&Arc<dyn MigrationUnit>> {
        self.units.iter().find(|unit| unit.version().as_i64() == version)
    }

    /// Returns the newest version, 0 when empty.
    #[must_use]
    pub fn latest(&self) -> MigrationVersion {
        self.units.last().map_or(MigrationVersion::new(0), |unit| unit.version())
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true when the catalog has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
