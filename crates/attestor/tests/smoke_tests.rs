//! Smoke tests for the attestor CLI
//!
//! None of these launch a browser.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the attestor binary with a clean `ATTEST_*` environment
fn attestor() -> Command {
    let mut cmd = Command::cargo_bin("attestor").expect("attestor binary should exist");
    for var in [
        "ATTEST_BASE_URL",
        "ATTEST_HEALTH_URL",
        "ATTEST_IDENTIFIER",
        "ATTEST_SECRET",
        "ATTEST_OUTPUT_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

const VALID: &str = "name: Admin events\nbase_url: http://app.test\ntarget: /admin/events\nchecks:\n  - type: header\n    label: Type\n";

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    attestor()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    attestor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_no_args_fails() {
    attestor().assert().failure();
}

#[test]
fn test_run_help_lists_env_overrides() {
    attestor()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ATTEST_BASE_URL"))
        .stdout(predicate::str::contains("--jobs"))
        .stdout(predicate::str::contains("--junit"));
}

// ============================================================================
// Init / Validate
// ============================================================================

#[test]
fn test_init_then_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("attest.yaml");

    attestor()
        .args(["init", path.to_str().unwrap()])
        .assert()
        .success();
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("/admin/events"));

    attestor()
        .args(["validate", path.to_str().unwrap()])
        .env("ATTEST_IDENTIFIER", "admin@example.test")
        .env("ATTEST_SECRET", "not-a-real-secret")
        .assert()
        .success()
        .stderr(predicate::str::contains("Admin events table"));
}

#[test]
fn test_init_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("attest.yaml");
    fs::write(&path, "existing").unwrap();

    attestor()
        .args(["init", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "existing");
}

#[test]
fn test_validate_reports_unset_variable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("attest.yaml");
    attestor()
        .args(["init", path.to_str().unwrap()])
        .assert()
        .success();

    attestor()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ATTEST_IDENTIFIER"));
}

#[test]
fn test_validate_plain_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ok.yaml");
    fs::write(&path, VALID).unwrap();

    attestor()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn test_validate_rejects_bad_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(
        &path,
        VALID.replace("type: header\n    label: Type", "type: row_badge\n    column: 0"),
    )
    .unwrap();

    attestor()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1-based"));
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn test_run_missing_file_fails_before_launch() {
    let dir = TempDir::new().unwrap();
    attestor()
        .args(["run", dir.path().join("missing.yaml").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.yaml"));
}

#[test]
fn test_run_rejects_half_credentials() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ok.yaml");
    fs::write(&path, VALID).unwrap();

    attestor()
        .args(["run", path.to_str().unwrap(), "--identifier", "qa@example.test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("identifier and secret"));
}
