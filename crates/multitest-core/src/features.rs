// crates/multitest-core/src/features.rs
// ============================================================================
// Module: Feature Sets
// Description: Validated feature universes and the combinations drawn from them.
// Purpose: Guarantee every feature name survives the comma-joined tool flag.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`FeatureSet`] is the fixed, ordered feature universe for one run. It is
//! validated once at construction so the runner never has to re-check names.
//! A [`Combination`] is a non-empty subset of that universe, kept in the
//! universe's order.
//!
//! ## Invariants
//! - Names are unique, non-empty, and never `default`.
//! - Names contain only alphanumerics (Unicode included) and `_`, `-`, `+`, `.`.
//! - A set holds at most [`MAX_FEATURES`] names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::combinations::Combinations;
use crate::combinations::combination_count;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of features in one set (65 535 combinations).
pub const MAX_FEATURES: usize = 16;
/// Maximum length of a single feature name in bytes.
pub const MAX_FEATURE_NAME_LENGTH: usize = 64;
/// Cargo's implicit default feature, which is never toggled explicitly.
const DEFAULT_FEATURE: &str = "default";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Feature set validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureSetError {
    /// A feature name was empty or whitespace.
    #[error("feature names must be non-empty")]
    EmptyName,
    /// A feature name exceeded [`MAX_FEATURE_NAME_LENGTH`].
    #[error("feature name `{name}` exceeds {limit} bytes")]
    NameTooLong {
        /// Offending name.
        name: String,
        /// Allowed length.
        limit: usize,
    },
    /// A feature name contained a character the tool flag cannot carry.
    #[error("feature name `{name}` contains invalid character `{character}`")]
    InvalidCharacter {
        /// Offending name.
        name: String,
        /// First invalid character.
        character: char,
    },
    /// The reserved `default` feature was listed.
    #[error("feature `default` cannot be toggled explicitly")]
    ReservedName,
    /// A feature name appeared twice.
    #[error("feature `{0}` is listed more than once")]
    Duplicate(String),
    /// Too many features to enumerate.
    #[error("{count} features exceed the limit of {limit}")]
    TooMany {
        /// Number of features supplied.
        count: usize,
        /// Allowed number of features.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Feature Set
// ============================================================================

/// Ordered, validated feature universe for a run.
///
/// # Invariants
/// - Order is the order names were supplied in; enumeration follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    /// Feature names in enumeration order.
    names: Vec<String>,
}

impl FeatureSet {
    /// Builds a feature set from names, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureSetError`] when a name is invalid, duplicated, or the
    /// set is larger than [`MAX_FEATURES`].
    pub fn new<I, S>(names: I) -> Result<Self, FeatureSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() > MAX_FEATURES {
            return Err(FeatureSetError::TooMany {
                count: names.len(),
                limit: MAX_FEATURES,
            });
        }
        validate_feature_names(names.iter().map(String::as_str))?;
        Ok(Self {
            names,
        })
    }

    /// Returns the feature names in enumeration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the number of features.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true when the set has no features.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns true when `name` is part of the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    /// Enumerates combinations, smallest first, up to `max_size` features each.
    #[must_use]
    pub fn combinations(&self, max_size: Option<usize>) -> Combinations<'_> {
        Combinations::new(&self.names, max_size)
    }

    /// Returns how many combinations [`FeatureSet::combinations`] will yield.
    #[must_use]
    pub fn combination_count(&self, max_size: Option<usize>) -> u64 {
        combination_count(self.names.len(), max_size)
    }
}

/// Checks names and uniqueness without applying the [`MAX_FEATURES`] cap.
///
/// Callers that trim a universe before building a [`FeatureSet`] validate the
/// untrimmed names with this first.
///
/// # Errors
///
/// Returns [`FeatureSetError`] for the first invalid or repeated name.
pub fn validate_feature_names<'a, I>(names: I) -> Result<(), FeatureSetError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = BTreeSet::new();
    for name in names {
        validate_name(name)?;
        if !seen.insert(name) {
            return Err(FeatureSetError::Duplicate(name.to_string()));
        }
    }
    Ok(())
}

/// Validates a single feature name.
fn validate_name(name: &str) -> Result<(), FeatureSetError> {
    if name.trim().is_empty() {
        return Err(FeatureSetError::EmptyName);
    }
    if name.len() > MAX_FEATURE_NAME_LENGTH {
        return Err(FeatureSetError::NameTooLong {
            name: name.to_string(),
            limit: MAX_FEATURE_NAME_LENGTH,
        });
    }
    if name == DEFAULT_FEATURE {
        return Err(FeatureSetError::ReservedName);
    }
    if let Some(character) = name.chars().find(|ch| !is_feature_char(*ch)) {
        return Err(FeatureSetError::InvalidCharacter {
            name: name.to_string(),
            character,
        });
    }
    Ok(())
}

/// Returns true for characters allowed in a feature name.
///
/// Cargo accepts Unicode identifiers, so non-ASCII letters and digits pass.
fn is_feature_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '+' | '.')
}

// ============================================================================
// SECTION: Combination
// ============================================================================

/// Non-empty subset of a [`FeatureSet`], in set order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination {
    /// Enabled features.
    features: Vec<String>,
}

impl Combination {
    /// Builds a combination from already-validated names.
    pub(crate) const fn from_validated(features: Vec<String>) -> Self {
        Self {
            features,
        }
    }

    /// Returns the enabled features.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Returns the number of enabled features (always at least one).
    #[must_use]
    pub const fn size(&self) -> usize {
        self.features.len()
    }

    /// Returns the comma-joined value passed to `--features`.
    #[must_use]
    pub fn feature_flag(&self) -> String {
        self.features.join(",")
    }

    /// Returns the human-readable list, e.g. `clipboard, piv`.
    #[must_use]
    pub fn label(&self) -> String {
        self.features.join(", ")
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label())
    }
}
