// crates/multitest-cli/src/lib.rs
// ============================================================================
// Module: multitest CLI Library
// Description: Shared helpers for the multitest command-line interface.
// Purpose: Provide reusable components (i18n, planning) for the binary and tests.
// Dependencies: multitest-config, multitest-core
// ============================================================================

//! ## Overview
//! This library module houses shared CLI utilities: the internationalized
//! message catalog and run planning. The binary entry point (`src/main.rs`)
//! imports these helpers to keep all user-facing output consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;
/// Flag, config, and manifest resolution into a run plan.
pub mod plan;

#[cfg(test)]
mod tests;
