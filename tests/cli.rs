//! End-to-end tests against the built advplcli binary.
//!
//! No bridge is installed next to the test binary, so every run that gets
//! past validation fails to launch it.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn advplcli(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("advplcli").unwrap();
    cmd.current_dir(cwd.path());
    cmd
}

#[test]
fn help_prints_usage_and_succeeds() {
    let cwd = TempDir::new().unwrap();
    for flag in ["-help", "--help", "-h", "/?"] {
        advplcli(&cwd)
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains("-compile"))
            .stdout(predicate::str::contains("-guara"));
    }
}

#[test]
fn unknown_flag_fails_with_usage() {
    let cwd = TempDir::new().unwrap();
    advplcli(&cwd)
        .args(["-server", "example.com", "-bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid parameter: -bogus"))
        .stdout(predicate::str::contains("parameters"));
}

#[test]
fn flag_without_value_is_rejected() {
    let cwd = TempDir::new().unwrap();
    advplcli(&cwd)
        .arg("-port")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("-port expects a value"));
}

#[test]
fn non_numeric_port_is_rejected() {
    let cwd = TempDir::new().unwrap();
    advplcli(&cwd).args(["-port", "abc"]).assert().code(1);
}

#[test]
fn missing_compile_target_fails_before_spawning() {
    let cwd = TempDir::new().unwrap();
    advplcli(&cwd)
        .args(["-compile", "does-not-exist"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn missing_bridge_is_a_launch_failure() {
    let cwd = TempDir::new().unwrap();
    advplcli(&cwd)
        .args(["-patch", "list.txt"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Failed to execute"));
}

#[test]
fn bare_double_dash_is_rejected() {
    let cwd = TempDir::new().unwrap();
    advplcli(&cwd)
        .arg("--")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid parameter: --"));

    advplcli(&cwd)
        .args(["--", "-compile", "/tmp"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("parameter name is empty"));
}
