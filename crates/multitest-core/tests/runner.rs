// crates/multitest-core/tests/runner.rs
// ============================================================================
// Module: Feature Combination Runner Tests
// Description: Runner semantics against a scripted invoker.
// Purpose: Pin fail-fast, collect-all, progress, and exit-code propagation.
// Dependencies: multitest-core
// ============================================================================

//! ## Overview
//! A scripted invoker records every invocation and fails chosen
//! combinations, so the runner's control flow can be checked without
//! spawning processes.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use multitest_core::Combination;
use multitest_core::CombinationFailure;
use multitest_core::ExitStatusKind;
use multitest_core::FailureMode;
use multitest_core::FeatureSet;
use multitest_core::InvocationResult;
use multitest_core::Invoker;
use multitest_core::RunObserver;
use multitest_core::RunOptions;
use multitest_core::RunOutcome;
use multitest_core::RunnerError;
use multitest_core::ToolCommand;
use multitest_core::run_feature_matrix;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Invoker that fails configured `verb:flag` keys and records every call.
#[derive(Default)]
struct ScriptedInvoker {
    failures: BTreeMap<String, ExitStatusKind>,
    calls: Vec<String>,
}

impl ScriptedInvoker {
    fn failing(mut self, key: &str, status: ExitStatusKind) -> Self {
        self.failures.insert(key.to_string(), status);
        self
    }
}

impl Invoker for ScriptedInvoker {
    fn invoke(
        &mut self,
        tool: &ToolCommand,
        combination: &Combination,
    ) -> Result<InvocationResult, RunnerError> {
        let key = format!("{}:{}", tool.verb(), combination.feature_flag());
        self.calls.push(key.clone());
        let status = self.failures.get(&key).copied().unwrap_or(ExitStatusKind::Code(0));
        Ok(InvocationResult {
            status,
            output: format!("output of {key}"),
        })
    }
}

/// Invoker whose tool can never be started.
struct MissingToolInvoker;

impl Invoker for MissingToolInvoker {
    fn invoke(
        &mut self,
        tool: &ToolCommand,
        _combination: &Combination,
    ) -> Result<InvocationResult, RunnerError> {
        Err(RunnerError::Spawn {
            program: tool.program().to_string(),
            error: "not found".to_string(),
        })
    }
}

/// Observer recording progress labels and surfaced failure output.
#[derive(Default)]
struct RecordingObserver {
    events: Vec<String>,
}

impl RunObserver for RecordingObserver {
    fn combination_started(
        &mut self,
        _tool: &ToolCommand,
        combination: &Combination,
    ) -> Result<(), RunnerError> {
        self.events.push(format!("start {combination}"));
        Ok(())
    }

    fn combination_failed(&mut self, failure: &CombinationFailure) -> Result<(), RunnerError> {
        self.events.push(format!("fail {}", failure.result.output));
        Ok(())
    }
}

fn abc() -> FeatureSet {
    FeatureSet::new(["A", "B", "C"]).unwrap()
}

fn cargo(verb: &str) -> ToolCommand {
    ToolCommand::new("cargo", verb, ".")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn all_passing_attempts_every_combination_and_passes() {
    let mut invoker = ScriptedInvoker::default();
    let mut observer = RecordingObserver::default();
    let report = run_feature_matrix(
        &abc(),
        &[cargo("test")],
        &mut invoker,
        &mut observer,
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(report.outcome(), RunOutcome::Passed);
    assert_eq!(report.invocations(), 7);
    assert_eq!(
        invoker.calls,
        vec![
            "test:A",
            "test:B",
            "test:C",
            "test:A,B",
            "test:A,C",
            "test:B,C",
            "test:A,B,C"
        ]
    );
    assert!(observer.events.iter().all(|event| event.starts_with("start ")));
    assert_eq!(observer.events.len(), 7);
}

#[test]
fn fail_fast_stops_after_kth_invocation() {
    let mut invoker = ScriptedInvoker::default().failing("test:A,C", ExitStatusKind::Code(101));
    let mut observer = RecordingObserver::default();
    let report = run_feature_matrix(
        &abc(),
        &[cargo("test")],
        &mut invoker,
        &mut observer,
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(invoker.calls.len(), 5);
    assert_eq!(invoker.calls.last().unwrap(), "test:A,C");
    assert_eq!(
        report.outcome(),
        RunOutcome::Failed {
            exit_code: 101
        }
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].invocation, 5);
    assert_eq!(observer.events.last().unwrap(), "fail output of test:A,C");
    assert_eq!(observer.events[observer.events.len() - 2], "start [A, C]");
}

#[test]
fn collect_all_attempts_everything_and_keeps_first_exit_code() {
    let mut invoker = ScriptedInvoker::default()
        .failing("test:B", ExitStatusKind::Code(3))
        .failing("test:A,B,C", ExitStatusKind::Code(9));
    let mut observer = RecordingObserver::default();
    let options = RunOptions {
        mode: FailureMode::CollectAll,
        max_size: None,
    };
    let report =
        run_feature_matrix(&abc(), &[cargo("test")], &mut invoker, &mut observer, options)
            .unwrap();

    assert_eq!(invoker.calls.len(), 7);
    let failed: Vec<String> =
        report.failures.iter().map(|failure| failure.combination.feature_flag()).collect();
    assert_eq!(failed, vec!["B", "A,B,C"]);
    assert_eq!(
        report.outcome(),
        RunOutcome::Failed {
            exit_code: 3
        }
    );
}

#[test]
fn signal_termination_fails_with_shell_style_exit_code() {
    let mut invoker = ScriptedInvoker::default().failing("test:A", ExitStatusKind::Signal(9));
    let mut observer = RecordingObserver::default();
    let report = run_feature_matrix(
        &abc(),
        &[cargo("test")],
        &mut invoker,
        &mut observer,
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(invoker.calls.len(), 1);
    assert_eq!(
        report.outcome(),
        RunOutcome::Failed {
            exit_code: 137
        }
    );
}

#[test]
fn verbs_sweep_in_order_and_fail_fast_spans_verbs() {
    let mut invoker = ScriptedInvoker::default().failing("test:B", ExitStatusKind::Code(2));
    let mut observer = RecordingObserver::default();
    let features = FeatureSet::new(["A", "B"]).unwrap();
    let report = run_feature_matrix(
        &features,
        &[cargo("clippy"), cargo("test")],
        &mut invoker,
        &mut observer,
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(invoker.calls, vec!["clippy:A", "clippy:B", "clippy:A,B", "test:A", "test:B"]);
    assert_eq!(report.failures[0].verb, "test");
}

#[test]
fn depth_limit_bounds_invocations() {
    let mut invoker = ScriptedInvoker::default();
    let mut observer = RecordingObserver::default();
    let options = RunOptions {
        mode: FailureMode::FailFast,
        max_size: Some(1),
    };
    let report =
        run_feature_matrix(&abc(), &[cargo("test")], &mut invoker, &mut observer, options)
            .unwrap();
    assert_eq!(report.invocations(), 3);
}

#[test]
fn empty_feature_set_runs_nothing() {
    let mut invoker = ScriptedInvoker::default();
    let mut observer = RecordingObserver::default();
    let features = FeatureSet::new(Vec::<String>::new()).unwrap();
    let report = run_feature_matrix(
        &features,
        &[cargo("test")],
        &mut invoker,
        &mut observer,
        RunOptions::default(),
    )
    .unwrap();
    assert_eq!(report.invocations(), 0);
    assert_eq!(report.outcome(), RunOutcome::Passed);
}

#[test]
fn spawn_errors_abort_the_run() {
    let mut observer = RecordingObserver::default();
    let err = run_feature_matrix(
        &abc(),
        &[cargo("test")],
        &mut MissingToolInvoker,
        &mut observer,
        RunOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, RunnerError::Spawn { .. }));
    assert_eq!(observer.events, vec!["start [A]"]);
}

#[test]
fn repeated_runs_produce_identical_reports() {
    let run = || {
        let mut invoker =
            ScriptedInvoker::default().failing("test:B,C", ExitStatusKind::Code(1));
        let mut observer = RecordingObserver::default();
        let options = RunOptions {
            mode: FailureMode::CollectAll,
            max_size: None,
        };
        run_feature_matrix(&abc(), &[cargo("test")], &mut invoker, &mut observer, options)
            .unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn tool_command_renders_feature_restricted_arguments() {
    let features = FeatureSet::new(["clipboard", "piv"]).unwrap();
    let combination = features.combinations(None).last().unwrap();
    let tool = ToolCommand::new("cargo", "test", ".").with_extra_args(vec!["--quiet".to_string()]);
    assert_eq!(
        tool.args(&combination),
        vec!["test", "--no-default-features", "--features", "clipboard,piv", "--quiet"]
    );
    assert_eq!(
        tool.command_line(&combination),
        "cargo test --no-default-features --features clipboard,piv --quiet"
    );
}
