// polyglot-core/src/core/columns.rs
// ============================================================================
// Module: Column-Type Factory
// Description: Logical column kinds and the physical descriptors they map to.
// Purpose: Derive dialect-correct column specs deterministically.
// Dependencies: serde, crate::dialect
// ============================================================================

//! ## Overview
//! [`column_for`] turns a logical [`ColumnKind`] into a [`ColumnSpec`] for one
//! dialect. The result depends only on the kind, the overrides, the options
//! and the strategy's declared capabilities, so the same inputs always yield
//! the same spec. Dialects without inline enums receive a bounded string with
//! a default and a check constraint instead of an enum type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::domain::InviteStatus;
use crate::core::domain::Role;
use crate::dialect::Dialect;
use crate::dialect::DialectStrategy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fractional-second digits used for precise timestamps.
const TIMESTAMP_PRECISION: u8 = 6;
/// Width of the string column standing in for an enum.
const ENUM_FALLBACK_LENGTH: u32 = 20;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Logical field kind understood by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ColumnKind {
    /// Encrypted secret or password hash with a fixed encoded width.
    BinarySecret,
    /// Encrypted token of variable width.
    BinaryToken,
    /// Project role (`admin`, `editor`, `viewer`).
    EnumeratedRole,
    /// Invite status (`sent`, `accepted`).
    EnumeratedStatus,
    /// Timestamp without fractional seconds.
    Timestamp,
    /// Timestamp with microsecond precision where supported.
    TimestampWithPrecision,
    /// Integer counter starting at zero.
    Counter,
    /// Generated primary-key identifier.
    Identifier,
    /// Column holding another row's identifier.
    IdentifierRef,
    /// Bounded string.
    ShortText {
        /// Maximum length in characters.
        length: u32,
    },
    /// Unbounded text.
    LongText,
    /// Plain integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// Row creation time, defaulted by storage.
    CreatedAt,
    /// Row modification time, defaulted by storage.
    UpdatedAt,
}

impl ColumnKind {
    /// Kinds the data-model layer requests from the factory directly.
    pub const FACTORY_KINDS: [Self; 7] = [
        Self::BinarySecret,
        Self::BinaryToken,
        Self::EnumeratedRole,
        Self::EnumeratedStatus,
        Self::Timestamp,
        Self::TimestampWithPrecision,
        Self::Counter,
    ];

    /// Returns a short kebab-case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BinarySecret => "binary-secret",
            Self::BinaryToken => "binary-token",
            Self::EnumeratedRole => "enumerated-role",
            Self::EnumeratedStatus => "enumerated-status",
            Self::Timestamp => "timestamp",
            Self::TimestampWithPrecision => "timestamp-with-precision",
            Self::Counter => "counter",
            Self::Identifier => "identifier",
            Self::IdentifierRef => "identifier-ref",
            Self::ShortText {
                ..
            } => "short-text",
            Self::LongText => "long-text",
            Self::Integer => "integer",
            Self::BigInteger => "big-integer",
            Self::CreatedAt => "created-at",
            Self::UpdatedAt => "updated-at",
        }
    }
}

/// Column default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum ColumnDefault {
    /// Integer literal.
    Integer(i64),
    /// String literal.
    Text(String),
    /// Current time at insert.
    CurrentTimestamp,
    /// Storage-generated identifier, where the dialect has a generator.
    GeneratedIdentifier,
}

/// Column-level check constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "values")]
pub enum CheckConstraint {
    /// Value must be one of the listed strings.
    OneOf(Vec<String>),
}

/// Physical column descriptor.
///
/// # Invariants
/// - `enum_values` is `Some` only for dialects with inline enum types.
/// - `precision` is `Some` only for dialects with fractional-second DDL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Physical type name, without length or precision.
    pub type_name: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Length hint.
    pub length: Option<u32>,
    /// Fractional-second precision.
    pub precision: Option<u8>,
    /// Default value.
    pub default: Option<ColumnDefault>,
    /// Check constraint standing in for an enum.
    pub check: Option<CheckConstraint>,
    /// Inline enum members.
    pub enum_values: Option<Vec<String>>,
}

impl ColumnSpec {
    /// Creates a NOT NULL spec with the given type name.
    fn of_type(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            nullable: false,
            length: None,
            precision: None,
            default: None,
            check: None,
            enum_values: None,
        }
    }

    /// Sets nullability.
    const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the length hint.
    const fn with_length(mut self, length: Option<u32>) -> Self {
        self.length = length;
        self
    }

    /// Sets the default value.
    fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }
}

/// Caller-supplied adjustments applied after the dialect mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    /// Nullability override.
    pub nullable: Option<bool>,
    /// Default override.
    pub default: Option<ColumnDefault>,
    /// Length override.
    pub length: Option<u32>,
    /// Precision override; dropped on dialects without fractional seconds.
    pub precision: Option<u8>,
}

impl ColumnOptions {
    /// Returns options forcing NOT NULL.
    #[must_use]
    pub fn not_null() -> Self {
        Self {
            nullable: Some(false),
            ..Self::default()
        }
    }

    /// Returns options forcing NULL.
    #[must_use]
    pub fn nullable() -> Self {
        Self {
            nullable: Some(true),
            ..Self::default()
        }
    }

    /// Returns a copy with a default value.
    #[must_use]
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }
}

/// Per-dialect physical type name replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialectOverrides {
    /// Replacement type for Postgres.
    pub postgres: Option<String>,
    /// Replacement type for MySQL.
    pub mysql: Option<String>,
    /// Replacement type for `SQLite`.
    pub sqlite: Option<String>,
}

impl DialectOverrides {
    /// Returns the override for `dialect`, if any.
    #[must_use]
    pub fn for_dialect(&self, dialect: Dialect) -> Option<&str> {
        match dialect {
            Dialect::Postgres => self.postgres.as_deref(),
            Dialect::Mysql => self.mysql.as_deref(),
            Dialect::Sqlite => self.sqlite.as_deref(),
        }
    }
}

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Maps a logical column kind to the physical spec for `strategy`'s dialect.
#[must_use]
pub fn column_for<S: DialectStrategy + ?Sized>(
    strategy: &S,
    kind: &ColumnKind,
    overrides: &DialectOverrides,
    options: &ColumnOptions,
) -> ColumnSpec {
    let types = strategy.physical_types();
    let precise = strategy.supports_fractional_seconds().then_some(TIMESTAMP_PRECISION);
    let mut spec = match *kind {
        ColumnKind::BinarySecret => ColumnSpec::of_type(types.binary)
            .with_nullable(true)
            .with_length(strategy.fixed_binary_length()),
        ColumnKind::BinaryToken => ColumnSpec::of_type(types.token_binary).with_nullable(true),
        ColumnKind::EnumeratedRole => {
            enumerated(strategy, &Role::STORED_VALUES, Role::Viewer.as_str())
        }
        ColumnKind::EnumeratedStatus => {
            enumerated(strategy, &InviteStatus::STORED_VALUES, InviteStatus::Sent.as_str())
        }
        ColumnKind::Timestamp => ColumnSpec::of_type(types.timestamp).with_nullable(true),
        ColumnKind::TimestampWithPrecision => {
            let mut spec = ColumnSpec::of_type(types.timestamp).with_nullable(true);
            spec.precision = precise;
            spec
        }
        ColumnKind::Counter => {
            ColumnSpec::of_type(types.integer).with_default(ColumnDefault::Integer(0))
        }
        ColumnKind::Identifier => {
            let spec =
                ColumnSpec::of_type(types.identifier).with_length(types.identifier_length);
            if strategy.generates_identifiers() {
                spec.with_default(ColumnDefault::GeneratedIdentifier)
            } else {
                spec
            }
        }
        ColumnKind::IdentifierRef => {
            ColumnSpec::of_type(types.identifier).with_length(types.identifier_length)
        }
        ColumnKind::ShortText {
            length,
        } => ColumnSpec::of_type(types.string).with_length(Some(length)),
        ColumnKind::LongText => ColumnSpec::of_type(types.long_text),
        ColumnKind::Integer => ColumnSpec::of_type(types.integer),
        ColumnKind::BigInteger => ColumnSpec::of_type(types.big_integer),
        ColumnKind::CreatedAt | ColumnKind::UpdatedAt => {
            let mut spec = ColumnSpec::of_type(types.timestamp)
                .with_default(ColumnDefault::CurrentTimestamp);
            spec.precision = precise;
            spec
        }
    };
    if let Some(nullable) = options.nullable {
        spec.nullable = nullable;
    }
    if let Some(default) = &options.default {
        spec.default = Some(default.clone());
    }
    if options.length.is_some() {
        spec.length = options.length;
    }
    if options.precision.is_some() {
        spec.precision = options.precision;
    }
    if let Some(type_name) = overrides.for_dialect(strategy.dialect()) {
        spec.type_name = type_name.to_string();
    }
    if !strategy.supports_fractional_seconds() {
        spec.precision = None;
    }
    if !strategy.supports_inline_enum() {
        spec.enum_values = None;
    }
    spec
}

/// Builds an enumerated column: inline enum where supported, else a checked string.
fn enumerated<S: DialectStrategy + ?Sized>(
    strategy: &S,
    values: &[&str],
    default: &str,
) -> ColumnSpec {
    let members: Vec<String> = values.iter().map(|value| (*value).to_string()).collect();
    let default = ColumnDefault::Text(default.to_string());
    if strategy.supports_inline_enum() {
        let mut spec = ColumnSpec::of_type("enum").with_default(default);
        spec.enum_values = Some(members);
        spec
    } else {
        let mut spec = ColumnSpec::of_type(strategy.physical_types().string)
            .with_length(Some(ENUM_FALLBACK_LENGTH))
            .with_default(default);
        spec.check = Some(CheckConstraint::OneOf(members));
        spec
    }
}
