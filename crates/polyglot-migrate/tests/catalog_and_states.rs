// polyglot-migrate/tests/catalog_and_states.rs
// ============================================================================
// Module: Catalog And State Tests
// Description: Catalog ordering rules and the unit lifecycle.
// Dependencies: polyglot-migrate, polyglot-core
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
use std::sync::Arc;

use polyglot_core::Dialect;
use polyglot_migrate::InvalidTransition;
use polyglot_migrate::MigrationCatalog;
use polyglot_migrate::MigrationContext;
use polyglot_migrate::MigrationError;
use polyglot_migrate::MigrationUnit;
use polyglot_migrate::MigrationVersion;
use polyglot_migrate::Reversibility;
use polyglot_migrate::StepError;
use polyglot_migrate::UnitState;
use polyglot_migrate::migrations::standard_units;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

struct Numbered(u32);

impl MigrationUnit for Numbered {
    fn version(&self) -> MigrationVersion {
        MigrationVersion::new(self.0)
    }

    fn label(&self) -> &'static str {
        "numbered"
    }

    fn up(&self, _ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        Ok(())
    }

    fn down(&self, _ctx: &mut MigrationContext<'_>) -> Result<(), StepError> {
        Ok(())
    }
}

fn catalog_of(versions: &[u32]) -> Result<MigrationCatalog, MigrationError> {
    MigrationCatalog::new(
        versions
            .iter()
            .map(|version| Arc::new(Numbered(*version)) as Arc<dyn MigrationUnit>)
            .collect(),
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn standard_catalog_is_dense_and_labelled_uniquely() {
    let catalog = MigrationCatalog::standard().expect("standard");
    assert_eq!(catalog.len(), 19);
    assert_eq!(catalog.latest(), MigrationVersion::new(19));
    let versions: Vec<i64> = catalog.units().iter().map(|unit| unit.version().as_i64()).collect();
    assert_eq!(versions, (1..=19).collect::<Vec<i64>>());
    let labels: BTreeSet<&str> = catalog.units().iter().map(|unit| unit.label()).collect();
    assert_eq!(labels.len(), 19);
    assert_eq!(catalog.get(4).map(|unit| unit.label()), Some("add-project-plans"));
    assert!(catalog.get(20).is_none());
}

#[test]
fn catalog_rejects_unordered_duplicate_and_zero_versions() {
    assert!(catalog_of(&[1, 2, 5]).is_ok());
    assert!(matches!(catalog_of(&[2, 1]), Err(MigrationError::Catalog(_))));
    assert!(matches!(catalog_of(&[1, 1]), Err(MigrationError::Catalog(_))));
    assert!(matches!(catalog_of(&[0, 1]), Err(MigrationError::Catalog(_))));
    assert!(catalog_of(&[]).expect("empty catalog").is_empty());
}

#[test]
fn reversibility_depends_on_dialect() {
    let units = standard_units();
    assert_eq!(units[5].reversibility(Dialect::Sqlite), Reversibility::Irreversible);
    assert_eq!(units[5].reversibility(Dialect::Postgres), Reversibility::Reversible);
    assert_eq!(units[5].reversibility(Dialect::Mysql), Reversibility::Reversible);
    assert_eq!(units[12].reversibility(Dialect::Mysql), Reversibility::Irreversible);
    assert_eq!(units[3].reversibility(Dialect::Sqlite), Reversibility::Reversible);
}

#[test]
fn unit_state_allows_only_lifecycle_moves() {
    let applying = UnitState::Pending.transition(UnitState::Applying).unwrap();
    assert_eq!(applying.transition(UnitState::Applied), Ok(UnitState::Applied));
    assert_eq!(applying.transition(UnitState::Pending), Ok(UnitState::Pending));
    assert_eq!(UnitState::Applied.transition(UnitState::Reverting), Ok(UnitState::Reverting));
    assert_eq!(UnitState::Reverting.transition(UnitState::Applied), Ok(UnitState::Applied));

    assert_eq!(
        UnitState::Pending.transition(UnitState::Applied),
        Err(InvalidTransition {
            from: UnitState::Pending,
            to: UnitState::Applied,
        })
    );
    assert!(UnitState::Applied.transition(UnitState::Applying).is_err());
    assert!(UnitState::Reverting.transition(UnitState::Applying).is_err());
    assert!(UnitState::Pending.is_terminal());
    assert!(!UnitState::Reverting.is_terminal());
    assert_eq!(UnitState::Applying.to_string(), "applying");
}

#[test]
fn version_display_is_zero_padded() {
    assert_eq!(MigrationVersion::new(4).to_string(), "004");
    assert_eq!(MigrationVersion::new(19).as_i64(), 19);
}
