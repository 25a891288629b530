// crates/multitest-cli/src/plan.rs
// ============================================================================
// Module: Run Planning
// Description: Merges flags, configuration, and the manifest into a run plan.
// Purpose: Decide the feature universe, tool commands, and options up front.
// Dependencies: multitest-config, multitest-core, thiserror
// ============================================================================

//! ## Overview
//! The feature universe comes from the first available source:
//! `--features`, then `features.include` in the config, then the `[features]`
//! table of the manifest. Names are validated on that untrimmed universe;
//! exclusions from the flag and the config are then removed, and only the
//! remainder has to fit within [`MAX_FEATURES`]. Flags override
//! configuration for verbs, depth limit, and mode.
//!
//! ## Invariants
//! - Planning performs no tool invocations.
//! - A plan always carries at least one tool command.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use multitest_config::MultitestConfig;
use multitest_core::FailureMode;
use multitest_core::FeatureSet;
use multitest_core::FeatureSetError;
use multitest_core::MANIFEST_FILE_NAME;
use multitest_core::MAX_FEATURES;
use multitest_core::ManifestError;
use multitest_core::RunOptions;
use multitest_core::ToolCommand;
use multitest_core::load_manifest_features;
use multitest_core::validate_feature_names;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Command-line overrides that feed the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanInputs {
    /// Repository root; tool processes run here.
    pub root: PathBuf,
    /// Manifest path; defaults to `<root>/Cargo.toml`.
    pub manifest_path: Option<PathBuf>,
    /// Explicit feature universe.
    pub features: Option<Vec<String>>,
    /// Features to drop from the universe.
    pub exclude: Vec<String>,
    /// Verbs overriding the configured ones.
    pub verbs: Vec<String>,
    /// Depth limit overriding the configured one.
    pub max_size: Option<usize>,
    /// Force collect-all mode.
    pub keep_going: bool,
}

/// Where the feature universe came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureSource {
    /// `--features` flag.
    CommandLine,
    /// `features.include` in the config file.
    Config,
    /// `[features]` table of the manifest at this path.
    Manifest(PathBuf),
}

/// Fully resolved run plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Feature universe after exclusions.
    pub features: FeatureSet,
    /// Origin of the feature universe.
    pub source: FeatureSource,
    /// Tool commands, one per verb, in sweep order.
    pub tools: Vec<ToolCommand>,
    /// Runner options.
    pub options: RunOptions,
    /// Excluded names that were not part of the universe.
    pub unknown_exclusions: Vec<String>,
}

impl RunPlan {
    /// Returns the total number of invocations the plan performs when every
    /// combination passes.
    #[must_use]
    pub fn invocation_count(&self) -> u64 {
        let per_tool = self.features.combination_count(self.options.max_size);
        let tools = u64::try_from(self.tools.len()).unwrap_or(u64::MAX);
        per_tool.saturating_mul(tools)
    }
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The manifest could not supply features.
    #[error("{path}: {source}")]
    Manifest {
        /// Manifest path.
        path: String,
        /// Underlying discovery error.
        source: ManifestError,
    },
    /// The feature universe is invalid.
    #[error(transparent)]
    Features(#[from] FeatureSetError),
    /// A verb flag is unusable.
    #[error("invalid verb `{0}`")]
    Verb(String),
    /// The depth limit is out of range.
    #[error("max size must be between 1 and {limit}")]
    MaxSize {
        /// Largest allowed value.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a [`RunPlan`] from flags and configuration.
///
/// # Errors
///
/// Returns [`PlanError`] when the manifest cannot be read, the universe is
/// invalid, or a flag value is out of range.
pub fn resolve_plan(inputs: &PlanInputs, config: &MultitestConfig) -> Result<RunPlan, PlanError> {
    let (universe, source) = resolve_universe(inputs, config)?;
    validate_feature_names(universe.iter().map(String::as_str))?;

    let mut excluded: Vec<String> = config.features.exclude.clone();
    for name in &inputs.exclude {
        if !excluded.contains(name) {
            excluded.push(name.clone());
        }
    }
    let unknown_exclusions =
        excluded.iter().filter(|name| !universe.contains(*name)).cloned().collect();
    let features =
        FeatureSet::new(universe.into_iter().filter(|name| !excluded.contains(name)))?;

    let verbs = if inputs.verbs.is_empty() { &config.tool.verbs } else { &inputs.verbs };
    for verb in verbs {
        if verb.trim().is_empty() || verb.chars().any(char::is_whitespace) {
            return Err(PlanError::Verb(verb.clone()));
        }
    }
    let tools = verbs
        .iter()
        .map(|verb| {
            ToolCommand::new(config.tool.program.clone(), verb.clone(), inputs.root.clone())
                .with_extra_args(config.tool.extra_args.clone())
        })
        .collect();

    let max_size = match inputs.max_size {
        Some(size) if size == 0 || size > MAX_FEATURES => {
            return Err(PlanError::MaxSize {
                limit: MAX_FEATURES,
            });
        }
        Some(size) => Some(size),
        None => config.max_size(),
    };
    let mode = if inputs.keep_going { FailureMode::CollectAll } else { config.run.mode };

    Ok(RunPlan {
        features,
        source,
        tools,
        options: RunOptions {
            mode,
            max_size,
        },
        unknown_exclusions,
    })
}

/// Picks the untrimmed feature universe from the highest-priority source.
fn resolve_universe(
    inputs: &PlanInputs,
    config: &MultitestConfig,
) -> Result<(Vec<String>, FeatureSource), PlanError> {
    if let Some(names) = &inputs.features {
        return Ok((names.clone(), FeatureSource::CommandLine));
    }
    if !config.features.include.is_empty() {
        return Ok((config.features.include.clone(), FeatureSource::Config));
    }
    let manifest = manifest_path(inputs);
    let names = load_manifest_features(&manifest, config.features.include_private).map_err(
        |source| PlanError::Manifest {
            path: manifest.display().to_string(),
            source,
        },
    )?;
    Ok((names, FeatureSource::Manifest(manifest)))
}

/// Returns the manifest path for the inputs.
fn manifest_path(inputs: &PlanInputs) -> PathBuf {
    inputs.manifest_path.clone().unwrap_or_else(|| default_manifest(&inputs.root))
}

/// Returns `<root>/Cargo.toml`.
fn default_manifest(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE_NAME)
}
