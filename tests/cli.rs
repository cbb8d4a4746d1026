// ABOUTME: Integration tests for the scon CLI commands.
// ABOUTME: Exercises paths that need no container runtime: help, config, list, errors.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn scon_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("scon"));
    cmd.env("SCON_HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_shows_commands() {
    let home = tempfile::tempdir().unwrap();
    scon_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn list_on_fresh_state_is_empty() {
    let home = tempfile::tempdir().unwrap();
    scon_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stateful containers"));

    assert!(home.path().join("containers.json").exists());
    assert!(home.path().join("config.yml").exists());
}

#[test]
fn list_json_prints_one_line_per_container() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join("containers.json"),
        r#"{"version": 1, "containers": [
            {"name": "web", "containers": [], "snapshots": [], "nextSnapshotToStart": null, "deleted": []},
            {"name": "db", "containers": [], "snapshots": [], "nextSnapshotToStart": null, "deleted": []}
        ]}"#,
    )
    .unwrap();

    let output = scon_cmd(home.path())
        .args(["--json", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "container");
    assert_eq!(lines[1]["name"], "db");
}

#[test]
fn config_show_prints_defaults() {
    let home = tempfile::tempdir().unwrap();
    scon_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("useSudo: false"))
        .stdout(predicate::str::contains("containerRuntime: docker"))
        .stdout(predicate::str::contains("maxSnapshots: 5"))
        .stdout(predicate::str::contains("retentionDays: 30"));
}

#[test]
fn config_set_persists_value() {
    let home = tempfile::tempdir().unwrap();
    scon_cmd(home.path())
        .args(["config", "set", "max_snapshots", "2"])
        .assert()
        .success();

    let content = fs::read_to_string(home.path().join("config.yml")).unwrap();
    assert!(content.contains("maxSnapshots: 2"));

    scon_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("maxSnapshots: 2"));
}

#[test]
fn config_set_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    scon_cmd(home.path())
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown configuration key"));
}

#[test]
fn start_unknown_container_fails() {
    let home = tempfile::tempdir().unwrap();
    scon_cmd(home.path())
        .args(["start", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn invalid_name_is_rejected_before_runtime_is_called() {
    let home = tempfile::tempdir().unwrap();
    scon_cmd(home.path())
        .args(["create", "Bad Name", "nginx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid container name"));
}

#[test]
fn invalid_delete_option_fails() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join("containers.json"),
        r#"{"version": 1, "containers": [{"name": "web"}]}"#,
    )
    .unwrap();

    scon_cmd(home.path())
        .args(["delete", "web", "everything", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown delete option"));
}

#[test]
fn delete_cancelled_at_prompt_keeps_entry() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join("containers.json"),
        r#"{"version": 1, "containers": [{"name": "web"}]}"#,
    )
    .unwrap();

    scon_cmd(home.path())
        .args(["delete", "web", "entry-only"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));

    let content = fs::read_to_string(home.path().join("containers.json")).unwrap();
    assert!(content.contains("\"web\""));
}

#[test]
fn delete_entry_only_with_force_needs_no_runtime() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join("containers.json"),
        r#"{"version": 1, "containers": [{"name": "web"}]}"#,
    )
    .unwrap();

    scon_cmd(home.path())
        .args(["delete", "web", "entry-only", "--force"])
        .assert()
        .success();

    scon_cmd(home.path())
        .args(["--quiet", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
