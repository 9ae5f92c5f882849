// polyglot-cli/src/render.rs
// ============================================================================
// Module: Output Rendering
// Description: Text and JSON renderings of migration and column results.
// Purpose: Keep command output deterministic and testable without a terminal.
// Dependencies: polyglot-core, polyglot-migrate, serde, serde_json
// ============================================================================

//! ## Overview
//! Renderers return owned lines or JSON strings; writing them is left to the
//! binary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_core::ColumnKind;
use polyglot_core::ColumnOptions;
use polyglot_core::ColumnSpec;
use polyglot_core::Dialect;
use polyglot_core::DialectOverrides;
use polyglot_core::column_for;
use polyglot_core::strategy_for;
use polyglot_migrate::MigrationReport;
use polyglot_migrate::Reversibility;
use polyglot_migrate::UnitStatus;
use serde::Serialize;

// ============================================================================
// SECTION: Migrations
// ============================================================================

/// Renders a run or revert report.
#[must_use]
pub fn report_lines(report: &MigrationReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .applied
        .iter()
        .map(|unit| format!("applied  {} {}", unit.version, unit.label))
        .chain(report.reverted.iter().map(|unit| format!("reverted {} {}", unit.version, unit.label)))
        .collect();
    if report.is_noop() {
        lines.push(format!("schema up to date at version {}", report.current_version));
    } else {
        lines.push(format!(
            "schema version {} -> {}",
            report.previous_version, report.current_version
        ));
    }
    lines
}

/// Renders one line per catalog unit.
#[must_use]
pub fn status_lines(statuses: &[UnitStatus]) -> Vec<String> {
    statuses
        .iter()
        .map(|status| {
            let reversibility = match status.reversibility {
                Reversibility::Reversible => "reversible",
                Reversibility::Irreversible => "irreversible",
            };
            format!(
                "{} {:<36} {:<8} {reversibility}",
                status.version,
                status.label,
                status.state.as_str()
            )
        })
        .collect()
}

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Physical column for one factory kind.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnEntry {
    /// Kind label.
    pub kind: &'static str,
    /// Physical column.
    pub column: ColumnSpec,
}

/// Returns the physical columns the factory produces on `dialect`.
#[must_use]
pub fn column_catalog(dialect: Dialect) -> Vec<ColumnEntry> {
    let strategy = strategy_for(dialect);
    let overrides = DialectOverrides::default();
    let options = ColumnOptions::default();
    ColumnKind::FACTORY_KINDS
        .iter()
        .map(|kind| ColumnEntry {
            kind: kind.label(),
            column: column_for(strategy.as_ref(), kind, &overrides, &options),
        })
        .collect()
}

/// Renders the column catalog of `dialect` as pretty JSON.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when serialization fails.
pub fn column_catalog_json(dialect: Dialect) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&column_catalog(dialect))
}
