// crates/multitest-core/tests/manifest.rs
// ============================================================================
// Module: Manifest Discovery Tests
// Description: Feature discovery from Cargo manifests.
// Purpose: Ensure the feature universe tracks the manifest and fails closed.
// Dependencies: multitest-core, tempfile
// ============================================================================

//! ## Overview
//! Validates `[features]` parsing, default/private filtering, and the errors
//! raised for missing, oversized, and malformed manifests.

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

use std::fs;

use multitest_core::FeatureSet;
use multitest_core::MAX_MANIFEST_BYTES;
use multitest_core::ManifestError;
use multitest_core::load_manifest_features;
use multitest_core::parse_manifest_features;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const PWM_MANIFEST: &str = r#"
[package]
name = "pwm"
version = "1.0.0"

[features]
default = ["clipboard", "piv"]
wifiqr = ["dep:qrcode"]
clipboard = ["dep:copypasta"]
piv = ["dep:yubirs"]
_bench = []

[dependencies]
qrcode = { version = "0.14", optional = true }
"#;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn discovers_sorted_public_features() {
    let features = parse_manifest_features(PWM_MANIFEST, false).unwrap();
    assert_eq!(features, vec!["clipboard", "piv", "wifiqr"]);
}

#[test]
fn includes_private_features_on_request() {
    let features = parse_manifest_features(PWM_MANIFEST, true).unwrap();
    assert_eq!(features, vec!["_bench", "clipboard", "piv", "wifiqr"]);
}

#[test]
fn unicode_feature_names_are_discovered_and_usable() {
    let manifest = "[features]\n\"größe\" = []\nstd = []\n";
    let features = parse_manifest_features(manifest, false).unwrap();
    assert_eq!(features, vec!["größe", "std"]);
    assert_eq!(FeatureSet::new(features).unwrap().combination_count(None), 3);
}

#[test]
fn manifest_without_features_table_has_no_features() {
    let features = parse_manifest_features("[package]\nname = \"plain\"\n", false).unwrap();
    assert!(features.is_empty());
}

#[test]
fn rejects_non_table_features() {
    let err = parse_manifest_features("features = [\"a\"]\n", false).unwrap_err();
    assert!(matches!(err, ManifestError::Invalid(_)), "unexpected error: {err}");
}

#[test]
fn rejects_feature_values_that_are_not_string_arrays() {
    let err = parse_manifest_features("[features]\nstd = true\n", false).unwrap_err();
    assert!(err.to_string().contains("`std`"), "unexpected error: {err}");
}

#[test]
fn rejects_invalid_toml() {
    let err = parse_manifest_features("[features\nstd = []", false).unwrap_err();
    assert!(matches!(err, ManifestError::Parse(_)));
}

#[test]
fn loads_manifest_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, PWM_MANIFEST).unwrap();
    assert_eq!(load_manifest_features(&path, false).unwrap(), vec!["clipboard", "piv", "wifiqr"]);
}

#[test]
fn missing_manifest_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_manifest_features(&dir.path().join("Cargo.toml"), false).unwrap_err();
    assert!(matches!(err, ManifestError::Io { .. }));
}

#[test]
fn oversized_manifest_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, vec![b'#'; MAX_MANIFEST_BYTES + 1]).unwrap();
    let err = load_manifest_features(&path, false).unwrap_err();
    assert!(matches!(err, ManifestError::TooLarge { .. }));
}

#[test]
fn non_utf8_manifest_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cargo.toml");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    let err = load_manifest_features(&path, false).unwrap_err();
    assert!(err.to_string().contains("utf-8"));
}
