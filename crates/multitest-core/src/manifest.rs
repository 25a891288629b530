// crates/multitest-core/src/manifest.rs
// ============================================================================
// Module: Manifest Feature Discovery
// Description: Reads the declared feature table from a Cargo manifest.
// Purpose: Keep the feature universe in sync with the crate under test.
// Dependencies: thiserror, toml
// ============================================================================

//! ## Overview
//! The `[features]` table of `Cargo.toml` is the authoritative feature list.
//! Discovery reads it at run start instead of duplicating it, and fails
//! closed on unreadable, oversized, or malformed manifests.
//!
//! ## Invariants
//! - Returned names are sorted and never include `default`.
//! - Names starting with `_` are only returned when explicitly requested.
//! - Implicit features of optional dependencies are not discovered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;
use toml::Table;
use toml::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Conventional manifest file name at a crate root.
pub const MANIFEST_FILE_NAME: &str = "Cargo.toml";
/// Maximum manifest size in bytes.
pub const MAX_MANIFEST_BYTES: usize = 1024 * 1024;
/// Manifest table holding feature declarations.
const FEATURES_TABLE: &str = "features";
/// Feature entry that only selects other features.
const DEFAULT_FEATURE: &str = "default";
/// Prefix marking a feature as internal.
const PRIVATE_PREFIX: char = '_';

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Manifest discovery errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("failed to read manifest {path}: {error}")]
    Io {
        /// Manifest path.
        path: String,
        /// Underlying error text.
        error: String,
    },
    /// The manifest exceeds [`MAX_MANIFEST_BYTES`].
    #[error("manifest {path} is {size} bytes (limit {limit})")]
    TooLarge {
        /// Manifest path.
        path: String,
        /// Actual size in bytes.
        size: u64,
        /// Allowed size in bytes.
        limit: usize,
    },
    /// The manifest is not valid TOML.
    #[error("failed to parse manifest: {0}")]
    Parse(String),
    /// The manifest parsed but its feature table is malformed.
    #[error("invalid manifest: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Loads the declared features from the manifest at `path`.
///
/// # Errors
///
/// Returns [`ManifestError`] when the file cannot be read, is too large, is
/// not UTF-8 TOML, or declares features in an unexpected shape.
pub fn load_manifest_features(
    path: &Path,
    include_private: bool,
) -> Result<Vec<String>, ManifestError> {
    let bytes = read_bytes_with_limit(path, MAX_MANIFEST_BYTES)?;
    let content = std::str::from_utf8(&bytes)
        .map_err(|_| ManifestError::Invalid("manifest must be utf-8".to_string()))?;
    parse_manifest_features(content, include_private)
}

/// Extracts the declared features from manifest text.
///
/// # Errors
///
/// Returns [`ManifestError`] when the text is not TOML or the `[features]`
/// table is malformed.
pub fn parse_manifest_features(
    content: &str,
    include_private: bool,
) -> Result<Vec<String>, ManifestError> {
    let document: Table =
        toml::from_str(content).map_err(|err| ManifestError::Parse(err.to_string()))?;
    let Some(features) = document.get(FEATURES_TABLE) else {
        return Ok(Vec::new());
    };
    let Value::Table(features) = features else {
        return Err(ManifestError::Invalid("`features` must be a table".to_string()));
    };
    let mut names = Vec::with_capacity(features.len());
    for (name, enables) in features {
        let valid = enables.as_array().is_some_and(|items| items.iter().all(Value::is_str));
        if !valid {
            return Err(ManifestError::Invalid(format!(
                "feature `{name}` must be an array of strings"
            )));
        }
        if name == DEFAULT_FEATURE {
            continue;
        }
        if !include_private && name.starts_with(PRIVATE_PREFIX) {
            continue;
        }
        names.push(name.clone());
    }
    names.sort();
    Ok(names)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ManifestError> {
    let io_error = |err: std::io::Error| ManifestError::Io {
        path: path.display().to_string(),
        error: err.to_string(),
    };
    let too_large = |size: u64| ManifestError::TooLarge {
        path: path.display().to_string(),
        size,
        limit: max_bytes,
    };
    let file = File::open(path).map_err(io_error)?;
    let size = file.metadata().map_err(io_error)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| too_large(size))?;
    if size > limit {
        return Err(too_large(size));
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(io_error)?;
    if bytes.len() > max_bytes {
        return Err(too_large(u64::try_from(bytes.len()).unwrap_or(u64::MAX)));
    }
    Ok(bytes)
}
