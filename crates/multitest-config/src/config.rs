// crates/multitest-config/src/config.rs
// ============================================================================
// Module: multitest Configuration
// Description: Configuration loading and validation for multitest.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: multitest-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The default `multitest.toml` at the repository root is optional; a path
//! named explicitly (flag or `MULTITEST_CONFIG`) must exist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use multitest_core::FailureMode;
use multitest_core::MAX_FEATURES;
use multitest_core::validate_feature_names;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename at the repository root.
pub const DEFAULT_CONFIG_NAME: &str = "multitest.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "MULTITEST_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of verbs per run.
pub(crate) const MAX_VERBS: usize = 8;
/// Maximum number of extra tool arguments.
pub(crate) const MAX_EXTRA_ARGS: usize = 64;
/// Maximum length of a program name, verb, or argument.
pub(crate) const MAX_ARG_LENGTH: usize = 4096;
/// Program run when none is configured.
const DEFAULT_PROGRAM: &str = "cargo";
/// Verb run when none is configured.
const DEFAULT_VERB: &str = "test";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// multitest configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultitestConfig {
    /// External tool configuration.
    #[serde(default)]
    pub tool: ToolConfig,
    /// Feature universe configuration.
    #[serde(default)]
    pub features: FeaturesConfig,
    /// Run behavior configuration.
    #[serde(default)]
    pub run: RunConfig,
}

/// External build/test tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Program to execute per combination.
    #[serde(default = "default_program")]
    pub program: String,
    /// Verbs swept in order, each over every combination.
    #[serde(default = "default_verbs")]
    pub verbs: Vec<String>,
    /// Arguments appended after the feature flags.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            verbs: default_verbs(),
            extra_args: Vec::new(),
        }
    }
}

/// Feature universe configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesConfig {
    /// Explicit feature universe; empty defers to the manifest.
    #[serde(default)]
    pub include: Vec<String>,
    /// Features removed from the universe.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Keep `_`-prefixed manifest features.
    #[serde(default)]
    pub include_private: bool,
    /// Largest combination size; `0` means unlimited.
    #[serde(default)]
    pub max_size: usize,
}

/// Run behavior configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Failure handling mode.
    #[serde(default)]
    pub mode: FailureMode,
}

impl MultitestConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// Resolution order: `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`] under `root`. Only the last may be absent, in
    /// which case defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok();
        let source = resolve_path(path, env_path.as_deref(), root)?;
        validate_path(&source.path)?;
        if !source.required && !source.path.exists() {
            return Ok(Self::default());
        }
        Self::load_file(&source.path)
    }

    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, too large, malformed,
    /// or invalid.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is malformed or invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tool.validate()?;
        self.features.validate()?;
        Ok(())
    }

    /// Returns the configured depth limit, if any.
    #[must_use]
    pub const fn max_size(&self) -> Option<usize> {
        if self.features.max_size == 0 { None } else { Some(self.features.max_size) }
    }
}

impl ToolConfig {
    /// Validates tool settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_argument("tool.program", &self.program)?;
        if self.program.trim() != self.program {
            return Err(ConfigError::Invalid(
                "tool.program must not have surrounding whitespace".to_string(),
            ));
        }
        if self.verbs.is_empty() {
            return Err(ConfigError::Invalid("tool.verbs must not be empty".to_string()));
        }
        if self.verbs.len() > MAX_VERBS {
            return Err(ConfigError::Invalid(format!(
                "tool.verbs exceeds {MAX_VERBS} entries"
            )));
        }
        for verb in &self.verbs {
            validate_argument("tool.verbs", verb)?;
            if verb.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "tool.verbs entry `{verb}` must not contain whitespace"
                )));
            }
        }
        if self.extra_args.len() > MAX_EXTRA_ARGS {
            return Err(ConfigError::Invalid(format!(
                "tool.extra_args exceeds {MAX_EXTRA_ARGS} entries"
            )));
        }
        for arg in &self.extra_args {
            validate_argument("tool.extra_args", arg)?;
        }
        Ok(())
    }
}

impl FeaturesConfig {
    /// Validates feature settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_feature_names(self.include.iter().map(String::as_str))
            .map_err(|err| ConfigError::Invalid(format!("features.include: {err}")))?;
        for name in &self.exclude {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "features.exclude entries must be non-empty".to_string(),
                ));
            }
        }
        if self.max_size > MAX_FEATURES {
            return Err(ConfigError::Invalid(format!(
                "features.max_size must be at most {MAX_FEATURES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Config path chosen by [`resolve_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    /// Path to read.
    pub path: PathBuf,
    /// Whether a missing file is an error.
    pub required: bool,
}

/// Resolves the config path from CLI, environment, or repository defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the environment path is too long.
pub fn resolve_path(
    path: Option<&Path>,
    env_path: Option<&str>,
    root: &Path,
) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            required: true,
        });
    }
    if let Some(env_path) = env_path.filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource {
            path: PathBuf::from(env_path),
            required: true,
        });
    }
    Ok(ConfigSource {
        path: root.join(DEFAULT_CONFIG_NAME),
        required: false,
    })
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a single program, verb, or argument string.
fn validate_argument(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} entries must be non-empty")));
    }
    if value.len() > MAX_ARG_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} entry exceeds max length")));
    }
    if value.contains('\0') {
        return Err(ConfigError::Invalid(format!("{field} entry must not contain NUL")));
    }
    Ok(())
}

/// Serde default for [`ToolConfig::program`].
fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

/// Serde default for [`ToolConfig::verbs`].
fn default_verbs() -> Vec<String> {
    vec![DEFAULT_VERB.to_string()]
}

// ============================================================================
// SECTION: Tests
// ============================================================================
