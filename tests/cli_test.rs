use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("mcp-manager").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("market"))
        .stdout(predicate::str::contains("pause"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("mcp-manager").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_env_without_equals_is_rejected() {
    let mut cmd = Command::cargo_bin("mcp-manager").unwrap();
    cmd.args(["add", "x", "--cmd", "npx", "--env", "NOVALUE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=value"));
}
