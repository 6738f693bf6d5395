//! CLI integration tests for lexgraph
//!
//! Runs the binary against a throwaway config directory using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config and environment overrides
#[allow(deprecated)]
fn lexgraph_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lexgraph").unwrap();
    cmd.env("LEXGRAPH_CONFIG_DIR", config_dir.path());
    cmd.env_remove("LEXGRAPH_EXTRACTION_URL");
    cmd.env_remove("LEXGRAPH_BIND");
    cmd.env_remove("LEXGRAPH_DATABASE_PATH");
    cmd
}

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();
    lexgraph_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_defaults() {
    let dir = TempDir::new().unwrap();
    lexgraph_cmd(&dir)
        .args(["config", "get", "extraction.timeout_secs"])
        .assert()
        .success()
        .stdout("120\n");
}

#[test]
fn test_config_set_persists() {
    let dir = TempDir::new().unwrap();

    lexgraph_cmd(&dir)
        .args(["config", "set", "server.admin_user_ids", "alice, bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set server.admin_user_ids"));

    assert!(dir.path().join("config.toml").exists());

    lexgraph_cmd(&dir)
        .args(["config", "get", "server.admin_user_ids"])
        .assert()
        .success()
        .stdout("alice, bob\n");

    lexgraph_cmd(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[learning]"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    lexgraph_cmd(&dir)
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_config_rejects_invalid_value() {
    let dir = TempDir::new().unwrap();
    lexgraph_cmd(&dir)
        .args(["config", "set", "extraction.timeout_secs", "0"])
        .assert()
        .failure();
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_doctor_creates_database() {
    let dir = TempDir::new().unwrap();
    lexgraph_cmd(&dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"));
    assert!(dir.path().join("lexgraph.db").exists());
}
