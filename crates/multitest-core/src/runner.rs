// crates/multitest-core/src/runner.rs
// ============================================================================
// Module: Feature Combination Runner
// Description: Drives the external tool across every feature combination.
// Purpose: Surface the first (or every) feature subset that breaks the build.
// Dependencies: crate::{features, invoke}, serde
// ============================================================================

//! ## Overview
//! [`run_feature_matrix`] walks each configured tool command over every
//! combination of the feature set, smallest subsets first. Before each
//! invocation the observer receives a progress notice; after a failing
//! invocation it receives the captured output.
//!
//! ## Invariants
//! - Invocations are strictly sequential, in enumeration order.
//! - In [`FailureMode::FailFast`] no invocation follows the first failure.
//! - In [`FailureMode::CollectAll`] every combination is attempted and the
//!   run's exit code is the first failure's.
//! - Identical inputs and tool behavior produce identical reports.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::features::Combination;
use crate::features::FeatureSet;
use crate::invoke::InvocationResult;
use crate::invoke::Invoker;
use crate::invoke::RunnerError;
use crate::invoke::ToolCommand;

// ============================================================================
// SECTION: Options
// ============================================================================

/// What the runner does after a combination fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Stop at the first failing combination.
    #[default]
    FailFast,
    /// Attempt every combination and report all failures.
    CollectAll,
}

/// Runner options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Failure handling mode.
    pub mode: FailureMode,
    /// Largest combination size to test; `None` tests every size.
    pub max_size: Option<usize>,
}

// ============================================================================
// SECTION: Observer
// ============================================================================

/// Receives progress notifications from the runner.
pub trait RunObserver {
    /// Called immediately before `tool` runs for `combination`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Report`] when progress cannot be written.
    fn combination_started(
        &mut self,
        tool: &ToolCommand,
        combination: &Combination,
    ) -> Result<(), RunnerError>;

    /// Called when a combination's invocation exits unsuccessfully.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Report`] when the failure cannot be written.
    fn combination_failed(&mut self, failure: &CombinationFailure) -> Result<(), RunnerError>;
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// A combination whose invocation exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationFailure {
    /// Verb that failed.
    pub verb: String,
    /// Failing combination.
    pub combination: Combination,
    /// One-based position of the invocation within the run.
    pub invocation: usize,
    /// Exit status and captured output.
    pub result: InvocationResult,
}

/// Final verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every attempted combination passed.
    Passed,
    /// At least one combination failed.
    Failed {
        /// Exit code of the first failing invocation.
        exit_code: i32,
    },
}

/// Record of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Attempted `(verb, combination)` pairs in invocation order.
    pub attempts: Vec<(String, Combination)>,
    /// Failures in invocation order.
    pub failures: Vec<CombinationFailure>,
}

impl RunReport {
    /// Returns the number of tool invocations performed.
    #[must_use]
    pub const fn invocations(&self) -> usize {
        self.attempts.len()
    }

    /// Returns the run verdict.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        self.failures.first().map_or(RunOutcome::Passed, |failure| RunOutcome::Failed {
            exit_code: failure.result.status.exit_code(),
        })
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs every tool command over every combination of `features`.
///
/// Tools run in order; each sweeps the full combination list before the next
/// starts.
///
/// # Errors
///
/// Returns [`RunnerError`] when a tool cannot be spawned or progress cannot
/// be reported. Failing combinations are not errors; see [`RunReport`].
pub fn run_feature_matrix<I, O>(
    features: &FeatureSet,
    tools: &[ToolCommand],
    invoker: &mut I,
    observer: &mut O,
    options: RunOptions,
) -> Result<RunReport, RunnerError>
where
    I: Invoker + ?Sized,
    O: RunObserver + ?Sized,
{
    let mut report = RunReport::default();
    for tool in tools {
        for combination in features.combinations(options.max_size) {
            observer.combination_started(tool, &combination)?;
            let result = invoker.invoke(tool, &combination)?;
            report.attempts.push((tool.verb().to_string(), combination.clone()));
            if result.succeeded() {
                continue;
            }
            let failure = CombinationFailure {
                verb: tool.verb().to_string(),
                combination,
                invocation: report.attempts.len(),
                result,
            };
            observer.combination_failed(&failure)?;
            report.failures.push(failure);
            if options.mode == FailureMode::FailFast {
                return Ok(report);
            }
        }
    }
    Ok(report)
}
