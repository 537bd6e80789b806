//! CLI Integration Tests
//!
//! Tests the CLI binary directly using assert_cmd to exercise main.rs code paths.

// Skip all CLI tests during coverage builds
#![cfg(not(coverage))]
#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn sheetbridge() -> Command {
    Command::cargo_bin("sheetbridge").unwrap()
}

fn write_input(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("beams.yaml");
    fs::write(
        &path,
        "- Name: B1\n  Length: 4.5\n  Grade: S355\n- Name: B2\n  Length: 6.25\n  Grade: S275\n",
    )
    .unwrap();
    path
}

fn push_beams(dir: &TempDir) -> PathBuf {
    let workbook = dir.path().join("book.xlsx");
    let input = write_input(dir);
    sheetbridge()
        .arg("push")
        .arg(&workbook)
        .arg(&input)
        .args(["-w", "Beams"])
        .assert()
        .success();
    workbook
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    sheetbridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sheetbridge"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    sheetbridge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sheetbridge"));
}

#[test]
fn test_push_help_lists_push_types() {
    sheetbridge()
        .args(["push", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UpdateOrCreateOnly"));
}

#[test]
fn test_read_help() {
    sheetbridge()
        .args(["read", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--mode"));
}

#[test]
fn test_no_subcommand_fails() {
    sheetbridge().assert().failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// PUSH TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_push_creates_workbook() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("book.xlsx");
    let input = write_input(&dir);

    sheetbridge()
        .args(["push", path_str(&workbook), path_str(&input), "-w", "Beams"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pushed 2 objects"));

    assert!(workbook.exists());
}

#[test]
fn test_push_with_config_file() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("book.xlsx");
    let input = write_input(&dir);
    let config = dir.path().join("layout.yaml");
    fs::write(&config, "worksheet: Layout\nstartingCell: C3\nobjectProperties: [Name]\n").unwrap();

    sheetbridge()
        .args(["push", path_str(&workbook), path_str(&input), "-c", path_str(&config)])
        .assert()
        .success();

    sheetbridge()
        .args(["read", path_str(&workbook), "-w", "Layout", "-r", "C3:C5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name"))
        .stdout(predicate::str::contains("B2"));
}

#[test]
fn test_push_update_only_without_workbook_fails() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("book.xlsx");
    let input = write_input(&dir);

    sheetbridge()
        .args(["push", path_str(&workbook), path_str(&input), "-t", "update-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));

    assert!(!workbook.exists());
}

#[test]
fn test_push_unknown_push_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);

    sheetbridge()
        .args(["push", "book.xlsx", path_str(&input), "-t", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown push type"));
}

#[test]
fn test_push_rejects_csv_target() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    let target = dir.path().join("book.csv");

    sheetbridge()
        .args(["push", path_str(&target), path_str(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid adapter settings"));
}

#[test]
fn test_push_rows_verbatim() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("book.xlsx");
    let input = dir.path().join("rows.json");
    fs::write(&input, r#"[["Span", "Load"], [1, 2.5], [2, 3.5]]"#).unwrap();

    sheetbridge()
        .args(["push", path_str(&workbook), path_str(&input), "--rows", "-w", "Loads"])
        .assert()
        .success();

    sheetbridge()
        .args(["read", path_str(&workbook), "-w", "Loads"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Span\tLoad"))
        .stdout(predicate::str::contains("2\t3.5"));
}

// ═══════════════════════════════════════════════════════════════════════════
// READ TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_read_values_as_table() {
    let dir = TempDir::new().unwrap();
    let workbook = push_beams(&dir);

    sheetbridge()
        .args(["read", path_str(&workbook), "-w", "Beams"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name\tLength\tGrade"))
        .stdout(predicate::str::contains("B2\t6.25\tS275"));
}

#[test]
fn test_read_objects_as_json() {
    let dir = TempDir::new().unwrap();
    let workbook = push_beams(&dir);

    let output = sheetbridge()
        .args(["read", path_str(&workbook), "-w", "Beams", "-m", "objects", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["Name"], "B1");
    assert_eq!(items[1]["Grade"], "S275");
}

#[test]
fn test_read_with_request_file() {
    let dir = TempDir::new().unwrap();
    let workbook = push_beams(&dir);
    let request = dir.path().join("request.yaml");
    fs::write(
        &request,
        "type: Batch\nrequests:\n  - type: Worksheets\n  - type: CellValues\n    worksheet: Beams\n    range: A2:A3\n",
    )
    .unwrap();

    sheetbridge()
        .args(["read", path_str(&workbook), "--request", path_str(&request)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beams"))
        .stdout(predicate::str::contains("B1"));
}

#[test]
fn test_read_missing_sheet_fails() {
    let dir = TempDir::new().unwrap();
    let workbook = push_beams(&dir);

    sheetbridge()
        .args(["read", path_str(&workbook), "-w", "Columns"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Worksheet 'Columns' cannot be found"));
}

#[test]
fn test_read_bad_range_fails() {
    let dir = TempDir::new().unwrap();
    let workbook = push_beams(&dir);

    sheetbridge()
        .args(["read", path_str(&workbook), "-r", "not-a-range"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid cell range"));
}

#[test]
fn test_read_missing_workbook_fails() {
    let dir = TempDir::new().unwrap();
    let workbook = dir.path().join("nothing.xlsx");

    sheetbridge()
        .args(["read", path_str(&workbook)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not be opened"));
}

// ═══════════════════════════════════════════════════════════════════════════
// SHEETS TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_sheets_lists_worksheets() {
    let dir = TempDir::new().unwrap();
    let workbook = push_beams(&dir);

    sheetbridge()
        .args(["sheets", path_str(&workbook)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beams"));
}

#[test]
fn test_sheets_filter_without_match() {
    let dir = TempDir::new().unwrap();
    let workbook = push_beams(&dir);

    sheetbridge()
        .args(["sheets", path_str(&workbook), "--filter", "slab"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching worksheets"));
}
