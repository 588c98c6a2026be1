//! File-based chain fixtures: every directory under `tests/fixtures/` holds a
//! `spec.json` chain, an `input.json` and the `expected.json` output.

use std::fs;
use std::path::{Path, PathBuf};

use jolt_core::Chainr;
use pretty_assertions::assert_eq;
use serde_json::Value;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn load(dir: &Path, file: &str) -> Value {
    let path = dir.join(file);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()))
}

fn fixture_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(FIXTURES_DIR)
        .expect("fixtures directory")
        .map(|entry| entry.expect("fixture entry").path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

#[test]
fn test_all_fixtures() {
    let dirs = fixture_dirs();
    assert!(dirs.len() >= 5, "expected fixture cases under {FIXTURES_DIR}");
    for dir in dirs {
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        let chain = Chainr::from_spec(&load(&dir, "spec.json"))
            .unwrap_or_else(|e| panic!("{name}: chain failed to build: {e}"));
        let actual = chain
            .transform(load(&dir, "input.json"))
            .unwrap_or_else(|e| panic!("{name}: transform failed: {e}"));
        assert_eq!(actual, load(&dir, "expected.json"), "fixture {name}");
    }
}

#[test]
fn test_fixtures_are_repeatable() {
    // A compiled chain keeps no state between runs.
    for dir in fixture_dirs() {
        let chain = Chainr::from_spec(&load(&dir, "spec.json")).unwrap();
        let input = load(&dir, "input.json");
        let first = chain.transform(input.clone()).unwrap();
        let second = chain.transform(input).unwrap();
        assert_eq!(first, second);
    }
}
