// crates/multitest-cli/src/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Unit tests for catalog parity and locale parsing.
// Purpose: Ensure CLI localization remains consistent across supported locales.
// Dependencies: multitest-cli i18n module
// ============================================================================

//! ## Overview
//! Verifies the CLI message catalogs stay in sync, locale parsing is tolerant,
//! and locale templates preserve placeholder parity with English.

use std::collections::BTreeSet;

use crate::i18n::Locale;
use crate::i18n::MessageArg;
use crate::i18n::SUPPORTED_LOCALES;
use crate::i18n::catalog_entries_for;
use crate::i18n::catalog_for;
use crate::i18n::translate;

/// Extracts `{name}` placeholders, rejecting malformed braces.
fn placeholder_names(template: &str) -> Result<BTreeSet<String>, String> {
    let mut names = BTreeSet::new();
    let mut rest = template;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open ..].starts_with('}') {
            return Err(format!("unmatched '}}' in {template:?}"));
        }
        let after = &rest[open + 1 ..];
        let Some(close) = after.find('}') else {
            return Err(format!("unclosed '{{' in {template:?}"));
        };
        let name = &after[.. close];
        if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_lowercase() || ch == '_') {
            return Err(format!("placeholder {name:?} must use [a-z_]"));
        }
        names.insert(name.to_string());
        rest = &after[close + 1 ..];
    }
    Ok(names)
}

#[test]
fn catalogs_have_matching_keys() {
    let en_keys: BTreeSet<&'static str> = catalog_for(Locale::En).keys().copied().collect();
    for locale in SUPPORTED_LOCALES {
        let locale_keys: BTreeSet<&'static str> = catalog_for(*locale).keys().copied().collect();
        assert_eq!(en_keys, locale_keys, "locale catalogs must stay in parity ({locale:?})");
    }
}

#[test]
fn catalogs_have_unique_keys_per_locale() {
    for locale in SUPPORTED_LOCALES {
        let entries = catalog_entries_for(*locale);
        let keys: BTreeSet<&str> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys.len(), entries.len(), "duplicate catalog key in {locale:?}");
    }
}

#[test]
fn catalogs_have_placeholder_parity_with_english() {
    for (key, en_template) in catalog_entries_for(Locale::En) {
        let expected = placeholder_names(en_template)
            .unwrap_or_else(|error| panic!("invalid English template for {key}: {error}"));
        for locale in SUPPORTED_LOCALES {
            let template = catalog_for(*locale)
                .get(key)
                .copied()
                .unwrap_or_else(|| panic!("missing key '{key}' in locale {locale:?}"));
            let actual = placeholder_names(template)
                .unwrap_or_else(|error| panic!("invalid template for {key} ({locale:?}): {error}"));
            assert_eq!(expected, actual, "placeholder mismatch for '{key}' in {locale:?}");
        }
    }
}

#[test]
fn catalan_differs_for_curated_keys() {
    for key in ["run.progress", "plan.no_features", "i18n.disclaimer.machine_translated"] {
        let en = catalog_for(Locale::En).get(key).copied();
        let ca = catalog_for(Locale::Ca).get(key).copied();
        assert!(en.is_some() && ca.is_some(), "missing curated key '{key}'");
        assert_ne!(en, ca, "Catalan must differ from English for '{key}'");
    }
}

#[test]
fn locale_parse_accepts_region_tags_and_case() {
    assert_eq!(Locale::parse("en"), Some(Locale::En));
    assert_eq!(Locale::parse("EN"), Some(Locale::En));
    assert_eq!(Locale::parse("en-US"), Some(Locale::En));
    assert_eq!(Locale::parse("en_US.UTF-8"), Some(Locale::En));
    assert_eq!(Locale::parse("ca"), Some(Locale::Ca));
    assert_eq!(Locale::parse("ca_ES"), Some(Locale::Ca));
    assert_eq!(Locale::parse("  "), None);
    assert_eq!(Locale::parse("de"), None);
}

#[test]
fn translate_substitutes_placeholders() {
    let output = translate(
        "run.summary.line",
        vec![
            MessageArg::new("verb", "test"),
            MessageArg::new("features", "a, c"),
            MessageArg::new("code", "101"),
        ],
    );
    assert!(output.contains("test [a, c]"), "{output}");
    assert!(output.contains("101"), "{output}");
}

#[test]
fn translate_unknown_key_falls_back_to_key() {
    assert_eq!(translate("no.such.key", Vec::new()), "no.such.key");
}
