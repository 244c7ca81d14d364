//! CLI integration tests for the icws command-line interface.
//!
//! These tests do not require a server: they cover argument parsing, local
//! validation of connection settings, and context management on a temporary
//! config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the icws binary with an isolated config directory.
fn icws(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("icws").unwrap();
    cmd.env("ICWS_CONFIG_DIR", config_dir.path())
        .env_remove("ICWS_SERVER")
        .env_remove("ICWS_USER")
        .env_remove("ICWS_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("connect"))
        .stdout(predicate::str::contains("request"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("icws"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_connect_rejects_invalid_scheme() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args([
            "--server",
            "tcp://cic.acme.org",
            "--user",
            "agent",
            "--password",
            "1234",
            "connect",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scheme"));
}

#[test]
fn test_connect_rejects_invalid_port() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args([
            "--server",
            "https://cic.acme.org:443",
            "--user",
            "agent",
            "--password",
            "1234",
            "connect",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid port 443"));
}

#[test]
fn test_invalid_address_fails_without_password_prompt() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args(["--server", "tcp://cic.acme.org", "--user", "agent", "connect"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scheme"))
        .stderr(predicate::str::contains("Password for").not());
}

#[test]
fn test_connect_rejects_blank_password() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args([
            "--server",
            "https://cic.acme.org",
            "--user",
            "agent",
            "--password",
            " ",
            "connect",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("password is empty"));
}

#[test]
fn test_connect_requires_server() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args(["--user", "agent", "--password", "1234", "connect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no server given"));
}

#[test]
fn test_request_rejects_unknown_verb() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args(["request", "TRACE", "/status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported verb"));
}

#[test]
fn test_request_rejects_invalid_body() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args(["request", "POST", "/status", "--body", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--body is not valid JSON"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Context Management Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_context_lifecycle() {
    let dir = TempDir::new().unwrap();

    icws(&dir)
        .args(["config", "get-contexts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No contexts configured"));

    icws(&dir)
        .args([
            "config",
            "set-context",
            "lab",
            "--server",
            "https://cic.lab.local",
            "--user",
            "agent",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Context \"lab\" created."));

    icws(&dir)
        .args(["config", "current-context"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab"));

    icws(&dir)
        .args(["config", "get-contexts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://cic.lab.local"))
        .stdout(predicate::str::contains("agent"));

    icws(&dir)
        .args(["config", "delete-context", "lab"])
        .assert()
        .success();

    icws(&dir)
        .args(["config", "use-context", "lab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_set_context_validates_server() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args(["config", "set-context", "bad", "--server", "http://cic:8019"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid port 8019"));
}

#[test]
fn test_context_supplies_server_and_user() {
    let dir = TempDir::new().unwrap();
    icws(&dir)
        .args([
            "config",
            "set-context",
            "lab",
            "--server",
            "https://cic.lab.local",
            "--user",
            "agent",
        ])
        .assert()
        .success();

    // The context provides a valid address; the blank password is then
    // rejected locally before any connection attempt.
    icws(&dir)
        .args(["--password", " ", "connect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("password is empty"));
}
