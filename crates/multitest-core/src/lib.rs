// crates/multitest-core/src/lib.rs
// ============================================================================
// Module: multitest Core Library
// Description: Public API surface for the feature combination runner.
// Purpose: Expose feature sets, enumeration, manifest discovery, and the runner.
// Dependencies: crate::{features, combinations, manifest, invoke, runner}
// ============================================================================

//! ## Overview
//! multitest core enumerates every non-empty subset of a crate's optional
//! features, smallest subsets first, and hands each subset to an external
//! build/test tool restricted to exactly those features. The first failing
//! subset stops the run unless collect-all mode is requested.
//!
//! The feature universe is passed explicitly into the runner and is usually
//! discovered from the crate's `Cargo.toml` at run start.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod combinations;
pub mod features;
pub mod invoke;
pub mod manifest;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use combinations::Combinations;
pub use combinations::combination_count;
pub use features::Combination;
pub use features::FeatureSet;
pub use features::FeatureSetError;
pub use features::MAX_FEATURE_NAME_LENGTH;
pub use features::MAX_FEATURES;
pub use features::validate_feature_names;
pub use invoke::ExitStatusKind;
pub use invoke::InvocationResult;
pub use invoke::Invoker;
pub use invoke::ProcessInvoker;
pub use invoke::RunnerError;
pub use invoke::ToolCommand;
pub use manifest::MANIFEST_FILE_NAME;
pub use manifest::MAX_MANIFEST_BYTES;
pub use manifest::ManifestError;
pub use manifest::load_manifest_features;
pub use manifest::parse_manifest_features;
pub use runner::CombinationFailure;
pub use runner::FailureMode;
pub use runner::RunObserver;
pub use runner::RunOptions;
pub use runner::RunOutcome;
pub use runner::RunReport;
pub use runner::run_feature_matrix;
