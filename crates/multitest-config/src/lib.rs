// crates/multitest-config/src/lib.rs
// ============================================================================
// Module: multitest Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for multitest.toml semantics.
// Dependencies: multitest-core, serde, toml
// ============================================================================

//! ## Overview
//! `multitest-config` defines the optional `multitest.toml` file that tunes
//! the external tool, the feature universe, and the failure mode. Parsing is
//! strict: unknown keys, oversized files, and invalid values fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
