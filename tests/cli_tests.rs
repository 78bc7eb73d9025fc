use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn stackup() -> Command {
    let mut cmd = Command::cargo_bin("stackup").expect("binary built");
    cmd.arg("--color").arg("never");
    cmd
}

#[test]
fn help_lists_subcommands() {
    stackup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("keys"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn validate_accepts_a_good_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stackup.toml");
    fs::write(&path, "[cluster]\nnamespace = \"dev\"\n").unwrap();

    stackup()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn validate_returns_nonzero_on_semantic_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stackup.toml");
    fs::write(&path, "[search]\nport = 0\n").unwrap();

    let output = stackup()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .output()
        .expect("run stackup");

    assert!(!output.status.success(), "Expected nonzero exit code");
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        combined.contains("search.port"),
        "Expected error naming the field.\n{combined}"
    );
}

#[test]
fn validate_points_at_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stackup.toml");
    fs::write(&path, "[search]\nport = \"seventy\"\n").unwrap();

    stackup()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn show_json_reports_defaults_without_a_file() {
    let dir = tempfile::tempdir().unwrap();

    stackup()
        .args(["--json", "config", "show", "--namespace", "search-dev", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"source\":\"defaults\""))
        .stdout(predicate::str::contains("\"namespace\":\"search-dev\""));
}

#[test]
fn env_masks_secrets_unless_revealed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(
        &path,
        "# generated\nMEILI_HOST=http://localhost:30700\nMEILI_SEARCH_KEY=abcdefghijkl\n",
    )
    .unwrap();

    stackup()
        .arg("env")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("abcd****"))
        .stdout(predicate::str::contains("abcdefghijkl").not())
        .stdout(predicate::str::contains("http://localhost:30700"));

    stackup()
        .args(["env", "--reveal"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("abcdefghijkl"));
}

#[test]
fn env_fails_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    stackup()
        .arg("env")
        .arg(dir.path().join("missing.env"))
        .assert()
        .failure();
}
