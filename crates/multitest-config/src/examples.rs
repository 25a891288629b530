// crates/multitest-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for `multitest --example-config`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for multitest configuration. Every key is shown with its
//! default value so the output doubles as reference documentation.

/// Returns a canonical example `multitest.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[tool]
program = "cargo"
verbs = ["test"]
extra_args = []

[features]
# Explicit feature universe; empty means "read [features] from Cargo.toml".
include = []
exclude = []
include_private = false
# Largest combination size to test; 0 tests every size.
max_size = 0

[run]
# "fail_fast" stops at the first failing combination; "collect_all" runs them all.
mode = "fail_fast"
"#,
    )
}
