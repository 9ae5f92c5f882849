// polyglot-core/src/core/identifiers.rs
// ============================================================================
// Module: Polyglot Identifiers
// Description: Opaque string identifiers for projects, users, clients, plans.
// Purpose: Keep identifier kinds from being mixed up at call sites.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque and serialize as plain strings. Storage assigns
//! their values; this module never validates their shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Declares a transparent string identifier with the usual conversions.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_identifier!(
    /// Project identifier.
    ProjectId
);

string_identifier!(
    /// Human user identifier.
    UserId
);

string_identifier!(
    /// Project API client identifier.
    ClientId
);

string_identifier!(
    /// Plan code, the primary key of the plan table (for example `default`).
    PlanCode
);
