// polyglot-cli/src/lib.rs
// ============================================================================
// Module: Polyglot CLI Library
// Description: Startup bootstrap and output rendering behind the binary.
// Purpose: Let services and the `polyglot` binary share one startup path.
// Dependencies: crate::{bootstrap, render}
// ============================================================================

//! ## Overview
//! [`bootstrap`] performs the startup sequence; [`render`] formats command
//! results.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bootstrap;
pub mod render;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bootstrap::BootstrapError;
pub use bootstrap::Runtime;
pub use bootstrap::Storage;
pub use bootstrap::audit_sink;
pub use bootstrap::bootstrap;
pub use bootstrap::open_storage;
