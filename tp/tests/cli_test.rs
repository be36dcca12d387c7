//! CLI smoke tests
//!
//! Only paths that need no network and no API keys are driven here; the
//! generation flow is covered by integration_test.rs against a scripted
//! model.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn config_file(temp: &TempDir) -> std::path::PathBuf {
    let plans_dir = temp.path().join("plans");
    let config_path = temp.path().join("tripplanner.yml");
    let yaml = format!(
        "storage:\n  plans-dir: {}\n  exports-dir: {}\n",
        plans_dir.display(),
        temp.path().join("exports").display()
    );
    std::fs::write(&config_path, yaml).unwrap();
    config_path
}

#[test]
fn test_detect_prints_candidates() {
    Command::cargo_bin("tp")
        .unwrap()
        .args(["detect", "We are planning a trip to Japan in spring"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Japan"));
}

#[test]
fn test_detect_reports_nothing_found() {
    Command::cargo_bin("tp")
        .unwrap()
        .args(["detect", "hello there, nice weather lately"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No destinations detected"));
}

#[test]
fn test_plans_list_empty_store() {
    let temp = TempDir::new().unwrap();
    let config = config_file(&temp);

    Command::cargo_bin("tp")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "plans", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved plans"));
}

#[test]
fn test_plans_show_missing_fails() {
    let temp = TempDir::new().unwrap();
    let config = config_file(&temp);

    Command::cargo_bin("tp")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "plans", "show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such plan"));
}

#[test]
fn test_export_missing_plan_fails() {
    let temp = TempDir::new().unwrap();
    let config = config_file(&temp);

    Command::cargo_bin("tp")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "export", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such plan"));
}
