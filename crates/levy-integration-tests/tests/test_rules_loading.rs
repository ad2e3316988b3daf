//! Rule-file loading through the same path the CLI uses.
//!
//! `load_registry` fails fast: a malformed file, an empty directory, or
//! a duplicate (jurisdiction, tax year) pair is an error, never a
//! silently defaulted registry.

use std::fs;

use levy_cli::load_registry;
use levy_core::{Jurisdiction, TaxYear};

const FEDERAL_2025: &str = include_str!("../../levy-rules/data/federal-2025.json");

#[test]
fn directory_of_rule_files_loads_and_resolves() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("us-2025.json"), FEDERAL_2025).unwrap();

    let registry = load_registry(Some(dir.path())).unwrap();
    let rules = registry
        .resolve(&Jurisdiction::new("US").unwrap(), TaxYear::new(2025).unwrap())
        .unwrap();
    assert_eq!(rules.rule_version, "us-federal-2025.1");
}

#[test]
fn builtin_registry_matches_the_shipped_rule_file() {
    let registry = load_registry(None).unwrap();
    let registered = registry.registered();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].0.as_str(), "US");
    assert_eq!(registered[0].1.as_u16(), 2025);
}

#[test]
fn unregistered_pair_is_a_hard_error() {
    let registry = load_registry(None).unwrap();
    assert!(registry
        .resolve(&Jurisdiction::new("US").unwrap(), TaxYear::new(2024).unwrap())
        .is_err());
    assert!(registry
        .resolve(&Jurisdiction::new("DE").unwrap(), TaxYear::new(2025).unwrap())
        .is_err());
}

#[test]
fn truncated_rule_file_fails_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a-valid.json"), FEDERAL_2025).unwrap();
    fs::write(
        dir.path().join("z-truncated.json"),
        &FEDERAL_2025[..FEDERAL_2025.len() / 2],
    )
    .unwrap();
    assert!(load_registry(Some(dir.path())).is_err());
}

#[test]
fn duplicate_pair_across_files_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("first.json"), FEDERAL_2025).unwrap();
    fs::write(dir.path().join("second.json"), FEDERAL_2025).unwrap();
    assert!(load_registry(Some(dir.path())).is_err());
}

#[test]
fn empty_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_registry(Some(dir.path())).is_err());
}

#[test]
fn non_json_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("us-2025.json"), FEDERAL_2025).unwrap();
    fs::write(dir.path().join("README.md"), "notes").unwrap();
    let registry = load_registry(Some(dir.path())).unwrap();
    assert_eq!(registry.len(), 1);
}
