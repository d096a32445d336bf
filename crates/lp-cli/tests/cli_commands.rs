//! Integration tests for the lp CLI commands.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TABLES: &str = r#"[
  {
    "id": "101",
    "name": "Race",
    "category": "race",
    "dice": "d20",
    "modifier": "cuMod",
    "entries": [
      {
        "id": "human", "min": 1, "max": 10, "result": "Human",
        "effects": [{ "kind": "race", "name": "Human" }]
      },
      {
        "id": "elf", "min": 11, "max": 20, "result": "Elf",
        "effects": [
          { "kind": "race", "name": "Elf", "languages": ["Elvish"] },
          { "kind": "modifier", "target": "dex", "value": 1 }
        ],
        "goto": "627 Elven Events"
      }
    ],
    "cross_references": [{ "condition": "race = Elf", "table": "627" }]
  },
  {
    "id": "627",
    "name": "Elven Events",
    "category": "youth",
    "dice": "d6",
    "entries": [
      {
        "id": "grove", "min": 1, "max": 6, "result": "Raised in a sacred grove",
        "effects": [{ "kind": "skill", "name": "Herbalism" }],
        "choices": [
          { "id": "stay", "label": "Stay with the druids",
            "effects": [{ "kind": "event", "title": "Became a druid" }] },
          { "id": "leave", "label": "Leave for the city" }
        ]
      }
    ]
  },
  {
    "id": "loop",
    "name": "Loop",
    "dice": "d4",
    "entries": [{ "id": "a", "min": 1, "max": 4, "result": "Again", "goto": { "target": "loop" } }]
  }
]"#;

/// Create a temp directory holding `tables.json`.
fn test_tables() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tables.json");
    fs::write(&path, TABLES).unwrap();
    (dir, path)
}

fn lifepath() -> Command {
    Command::cargo_bin("lifepath").unwrap()
}

// ---------------------------------------------------------------------------
// roll
// ---------------------------------------------------------------------------

#[test]
fn roll_prints_result() {
    lifepath()
        .args(["roll", "3d6", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3d6").and(predicate::str::contains("Result:")));
}

#[test]
fn roll_is_reproducible_with_seed() {
    let first = lifepath().args(["roll", "d100", "--seed", "11"]).output().unwrap();
    let second = lifepath().args(["roll", "d100", "--seed", "11"]).output().unwrap();
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn roll_with_advantage_shows_discarded() {
    lifepath()
        .args(["roll", "d20", "--advantage", "--mod", "Cultural=2", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("discarded").and(predicate::str::contains("Cultural")));
}

#[test]
fn roll_rejects_bad_notation() {
    lifepath()
        .args(["roll", "2x6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid dice notation"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_valid_tables() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["check", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed")
                .and(predicate::str::contains("3 tables"))
                .and(predicate::str::contains("Elven Events")),
        );
}

#[test]
fn check_reports_overlap() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{"id": "x", "name": "X", "entries": [
            {"id": "a", "min": 1, "max": 12, "result": "A"},
            {"id": "b", "min": 10, "max": 20, "result": "B"}
        ]}"#,
    )
    .unwrap();

    lifepath()
        .args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:").and(predicate::str::contains("overlap")));
}

#[test]
fn check_missing_file() {
    lifepath()
        .args(["check", "/nonexistent/tables.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_shows_tables() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["list", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Race")
                .and(predicate::str::contains("Elven Events"))
                .and(predicate::str::contains("cuMod")),
        );
}

#[test]
fn list_filters_by_category() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["list", path.to_str().unwrap(), "--category", "youth"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Elven Events")
                .and(predicate::str::contains("101").not()),
        );
}

#[test]
fn list_no_matches() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["list", path.to_str().unwrap(), "--category", "occupation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tables found"));
}

#[test]
fn list_custom_category_ignores_case() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dreams.json");
    fs::write(
        &path,
        r#"{"id": "900", "name": "Strange Dreams", "category": "Dreams", "dice": "d6",
            "entries": [{"id": "a", "min": 1, "max": 6, "result": "A dream"}]}"#,
    )
    .unwrap();

    for category in ["dreams", "DREAMS", "Dreams"] {
        lifepath()
            .args(["list", path.to_str().unwrap(), "--category", category])
            .assert()
            .success()
            .stdout(predicate::str::contains("Strange Dreams"));
    }
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_follows_goto() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["resolve", path.to_str().unwrap(), "101", "--manual", "15", "--seed", "1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Elf")
                .and(predicate::str::contains("Raised in a sacred grove"))
                .and(predicate::str::contains("see also: race = Elf"))
                .and(predicate::str::contains("Herbalism")),
        );
}

#[test]
fn resolve_no_goto() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["resolve", path.to_str().unwrap(), "101", "--manual", "15", "--no-goto"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Elf")
                .and(predicate::str::contains("sacred grove").not()),
        );
}

#[test]
fn resolve_with_ad_hoc_modifier() {
    let (_dir, path) = test_tables();
    lifepath()
        .args([
            "resolve",
            path.to_str().unwrap(),
            "101",
            "--manual",
            "5",
            "--mod",
            "luck=10",
            "--no-goto",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 +10 = 15").and(predicate::str::contains("Elf")));
}

#[test]
fn resolve_json_output() {
    let (_dir, path) = test_tables();
    let output = lifepath()
        .args(["resolve", path.to_str().unwrap(), "101", "--manual", "3", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["result"]["success"], true);
    assert_eq!(doc["result"]["roll_result"], 3);
    assert_eq!(doc["result"]["entry"]["id"], "human");
    assert_eq!(doc["choice"], serde_json::Value::Null);
}

#[test]
fn resolve_reads_and_writes_subject() {
    let (dir, path) = test_tables();
    let subject_in = dir.path().join("subject.json");
    let subject_out = dir.path().join("out.json");
    fs::write(&subject_in, r#"{"name": "Ayla", "modifiers": {"cuMod": 10}}"#).unwrap();

    lifepath()
        .args([
            "resolve",
            path.to_str().unwrap(),
            "101",
            "--manual",
            "1",
            "--no-goto",
            "--subject",
            subject_in.to_str().unwrap(),
            "--output",
            subject_out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ayla"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&subject_out).unwrap()).unwrap();
    assert_eq!(saved["race"]["name"], "Elf");
    assert_eq!(saved["attributes"]["dexterity"], 11);
    assert_eq!(saved["modifiers"]["cuMod"], 10);
}

#[test]
fn resolve_manual_entry() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["resolve", path.to_str().unwrap(), "101", "--entry", "human"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Human").and(predicate::str::contains("manual")));
}

#[test]
fn resolve_with_choice() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["resolve", path.to_str().unwrap(), "627", "--choice", "stay"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chose").and(predicate::str::contains("Became a druid")));
}

#[test]
fn resolve_with_invalid_choice() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["resolve", path.to_str().unwrap(), "627", "--choice", "fly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid choice selected: fly"));
}

#[test]
fn resolve_detects_cycle() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["resolve", path.to_str().unwrap(), "loop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular reference detected: loop -> loop"));
}

#[test]
fn resolve_unknown_table() {
    let (_dir, path) = test_tables();
    lifepath()
        .args(["resolve", path.to_str().unwrap(), "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Table not found: 999"));
}

#[test]
fn resolve_respects_config_depth() {
    let (dir, path) = test_tables();
    let config = dir.path().join("engine.json");
    fs::write(&config, r#"{"max_depth": 1}"#).unwrap();

    lifepath()
        .args([
            "resolve",
            path.to_str().unwrap(),
            "101",
            "--manual",
            "15",
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Maximum recursion depth 1 exceeded"));
}

#[test]
fn resolve_rejects_inverted_bounds_config() {
    let (dir, path) = test_tables();
    let config = dir.path().join("engine.json");
    fs::write(&config, r#"{"modifier_bounds": {"min": 5, "max": -5}}"#).unwrap();

    lifepath()
        .args([
            "resolve",
            path.to_str().unwrap(),
            "101",
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid modifier bounds"));
}

#[test]
fn resolve_with_extreme_modifier() {
    let (_dir, path) = test_tables();
    lifepath()
        .args([
            "resolve",
            path.to_str().unwrap(),
            "101",
            "--manual",
            "5",
            "--mod",
            "luck=2147483647",
            "--no-goto",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Elf"));
}

#[test]
fn roll_with_extreme_modifier() {
    lifepath()
        .args(["roll", "d20", "--mod", "luck=2147483647", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2147483647"));
}
