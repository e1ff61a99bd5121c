//! CLI smoke tests for the `rw` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `rw` with HOME and the data dirs pointed at a scratch directory
fn rw(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rw").expect("rw binary should build");
    cmd.env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .current_dir(home.path());
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().expect("Failed to create temp dir");
    rw(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("types"))
        .stdout(predicate::str::contains("Logs are written to"));
}

#[test]
fn test_types_lists_every_restoration_type() {
    let home = TempDir::new().expect("Failed to create temp dir");
    rw(&home)
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("pollinator-haven"))
        .stdout(predicate::str::contains("wildlife-pond"))
        .stdout(predicate::str::contains("medium"));
}

#[test]
fn test_plan_rejects_unknown_type() {
    let home = TempDir::new().expect("Failed to create temp dir");
    rw(&home)
        .args(["plan", "lot.jpg", "--type", "car-park"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown restoration type"));
}

#[test]
fn test_analyze_without_api_key_fails_fast() {
    let home = TempDir::new().expect("Failed to create temp dir");
    rw(&home)
        .env_remove("GEMINI_API_KEY")
        .args(["analyze", "lot.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_bad_config_file_is_reported() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let config = home.path().join("broken.yml");
    std::fs::write(&config, "retry: [not, a, map").unwrap();
    rw(&home)
        .args(["--config", config.to_str().unwrap(), "types"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
