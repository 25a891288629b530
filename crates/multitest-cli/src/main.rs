// crates/multitest-cli/src/main.rs
// ============================================================================
// Module: multitest CLI Entry Point
// Description: Runs the external test tool for every feature combination.
// Purpose: Surface feature-interaction bugs with a single command.
// Dependencies: clap, multitest-config, multitest-core, thiserror.
// ============================================================================

//! ## Overview
//! With no arguments `multitest` reads the `[features]` table of
//! `./Cargo.toml` and runs `cargo test --no-default-features --features
//! <combination>` for every non-empty combination, smallest first. The first
//! failing combination's output is printed and its exit code becomes the
//! process exit code. All user-facing strings are routed through the i18n
//! catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Parser;
use clap::ValueEnum;
use multitest_cli::i18n::Locale;
use multitest_cli::i18n::set_locale;
use multitest_cli::plan::FeatureSource;
use multitest_cli::plan::PlanError;
use multitest_cli::plan::PlanInputs;
use multitest_cli::plan::RunPlan;
use multitest_cli::plan::resolve_plan;
use multitest_cli::t;
use multitest_config::MultitestConfig;
use multitest_config::config_toml_example;
use multitest_core::Combination;
use multitest_core::CombinationFailure;
use multitest_core::FailureMode;
use multitest_core::ProcessInvoker;
use multitest_core::RunObserver;
use multitest_core::RunOutcome;
use multitest_core::RunReport;
use multitest_core::RunnerError;
use multitest_core::ToolCommand;
use multitest_core::run_feature_matrix;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "MULTITEST_LANG";
/// Exit code used when the tool's own code cannot be propagated.
const FALLBACK_EXIT_CODE: u8 = 1;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "multitest", disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue)]
    show_version: bool,
    /// Print an example configuration file and exit.
    #[arg(long, action = ArgAction::SetTrue)]
    example_config: bool,
    /// Preferred output language (overrides `MULTITEST_LANG`).
    #[arg(long, value_enum, value_name = "LANG")]
    lang: Option<LangArg>,
    /// Repository root; the tool runs here (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Manifest to read features from (defaults to `<root>/Cargo.toml`).
    #[arg(long, value_name = "PATH")]
    manifest_path: Option<PathBuf>,
    /// Config file path (defaults to `<root>/multitest.toml` or `MULTITEST_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit comma-separated feature universe.
    #[arg(long, value_name = "FEATURES", value_delimiter = ',')]
    features: Option<Vec<String>>,
    /// Comma-separated features to leave out.
    #[arg(long, value_name = "FEATURES", value_delimiter = ',')]
    exclude: Vec<String>,
    /// Tool subcommand to sweep (repeatable; defaults to `test`).
    #[arg(long = "verb", value_name = "VERB")]
    verbs: Vec<String>,
    /// Largest combination size to test.
    #[arg(long, value_name = "N")]
    max_size: Option<usize>,
    /// Keep going after failures and report every failing combination.
    #[arg(long, action = ArgAction::SetTrue)]
    keep_going: bool,
    /// List the planned commands without running them.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Echo each command line to stderr before running it.
    #[arg(long, short = 'v', action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli {
    /// Builds planning inputs from the parsed flags.
    fn plan_inputs(&self, root: PathBuf) -> PlanInputs {
        PlanInputs {
            root,
            manifest_path: self.manifest_path.clone(),
            features: self.features.clone(),
            exclude: self.exclude.clone(),
            verbs: self.verbs.clone(),
            max_size: self.max_size,
            keep_going: self.keep_going,
        }
    }
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    if cli.example_config {
        write_stdout_text(&config_toml_example())
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = MultitestConfig::load(cli.config.as_deref(), &root)
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let plan = resolve_plan(&cli.plan_inputs(root), &config).map_err(plan_error)?;

    for feature in &plan.unknown_exclusions {
        write_stderr_line(&t!("plan.exclude_unknown", feature = feature))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    if plan.features.is_empty() {
        write_stderr_line(&t!("plan.no_features"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    if cli.dry_run {
        return command_dry_run(&plan);
    }
    command_run(&plan, cli.verbose)
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs every planned invocation.
fn command_run(plan: &RunPlan, verbose: bool) -> CliResult<ExitCode> {
    let mut observer = ConsoleObserver {
        show_verb: plan.tools.len() > 1,
        verbose,
    };
    let report = run_feature_matrix(
        &plan.features,
        &plan.tools,
        &mut ProcessInvoker,
        &mut observer,
        plan.options,
    )
    .map_err(|err| CliError::new(t!("run.failed", error = err)))?;

    match report.outcome() {
        RunOutcome::Passed => Ok(ExitCode::SUCCESS),
        RunOutcome::Failed {
            exit_code,
        } => {
            if plan.options.mode == FailureMode::CollectAll {
                write_summary(&report)
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
            Ok(ExitCode::from(exit_code_for(exit_code)))
        }
    }
}

/// Lists planned command lines without running them.
fn command_dry_run(plan: &RunPlan) -> CliResult<ExitCode> {
    write_stdout_line(&t!("dry_run.source", source = source_label(&plan.source)))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&t!(
        "dry_run.header",
        count = plan.invocation_count(),
        features = plan.features.len()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for tool in &plan.tools {
        for combination in plan.features.combinations(plan.options.max_size) {
            write_stdout_line(&t!("dry_run.line", command = tool.command_line(&combination)))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Progress Output
// ============================================================================

/// Observer writing progress labels and failure output to the console.
struct ConsoleObserver {
    /// Include the verb in progress labels.
    show_verb: bool,
    /// Echo command lines to stderr.
    verbose: bool,
}

impl RunObserver for ConsoleObserver {
    fn combination_started(
        &mut self,
        tool: &ToolCommand,
        combination: &Combination,
    ) -> Result<(), RunnerError> {
        let label = if self.show_verb {
            t!("run.progress_verb", verb = tool.verb(), features = combination.label())
        } else {
            t!("run.progress", features = combination.label())
        };
        write_stdout_line(&label)
            .map_err(|err| RunnerError::Report(output_error("stdout", &err)))?;
        if self.verbose {
            write_stderr_line(&t!("run.command", command = tool.command_line(combination)))
                .map_err(|err| RunnerError::Report(output_error("stderr", &err)))?;
        }
        Ok(())
    }

    fn combination_failed(&mut self, failure: &CombinationFailure) -> Result<(), RunnerError> {
        write_stdout_text(&failure.result.output)
            .map_err(|err| RunnerError::Report(output_error("stdout", &err)))
    }
}

/// Writes the collect-all failure summary.
fn write_summary(report: &RunReport) -> std::io::Result<()> {
    write_stdout_line(&t!(
        "run.summary.header",
        failed = report.failures.len(),
        total = report.invocations()
    ))?;
    for failure in &report.failures {
        write_stdout_line(&t!(
            "run.summary.line",
            verb = failure.verb,
            features = failure.combination.label(),
            code = failure.result.status.exit_code()
        ))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Describes where the feature universe came from.
fn source_label(source: &FeatureSource) -> String {
    match source {
        FeatureSource::CommandLine => t!("dry_run.source.command_line"),
        FeatureSource::Config => t!("dry_run.source.config"),
        FeatureSource::Manifest(path) => path.display().to_string(),
    }
}

/// Maps a tool exit code onto a non-zero process exit code.
fn exit_code_for(code: i32) -> u8 {
    u8::try_from(code).ok().filter(|code| *code != 0).unwrap_or(FALLBACK_EXIT_CODE)
}

/// Resolves the output locale from the flag or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

/// Converts a planning error into a localized CLI error.
fn plan_error(err: PlanError) -> CliError {
    let message = match err {
        PlanError::Manifest {
            path,
            source,
        } => t!("plan.manifest_failed", path = path, error = source),
        PlanError::Features(err) => t!("plan.features_invalid", error = err),
        PlanError::Verb(verb) => t!("plan.verb_invalid", verb = verb),
        PlanError::MaxSize {
            limit,
        } => t!("plan.max_size_invalid", limit = limit),
    };
    CliError::new(message)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes captured text to stdout, terminating it with a newline.
fn write_stdout_text(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::from(FALLBACK_EXIT_CODE)
}
