//! End-to-end checks of the `dbsync` binary that never reach a real host.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const CONFIG: &str = r#"
application = "library"
recipe = "bedrock"

[settings]
"bin/wp" = "wp"

[hosts.production]
hostname = "web1.library.ca"
remote_user = "deploy"
env = "production"

[hosts.staging]
hostname = "staging.library.ca"
port = 2222
env = "staging"
"#;

fn project(root: &Path) {
    std::fs::create_dir_all(root.join(".dbsync")).unwrap();
    std::fs::write(root.join(".dbsync").join("config.toml"), CONFIG).unwrap();
}

fn dbsync() -> Command {
    let mut cmd = Command::cargo_bin("dbsync").unwrap();
    cmd.env_remove("DBSYNC_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_hosts_json_lists_every_host() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());

    let output = dbsync()
        .current_dir(dir.path())
        .args(["hosts", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let hosts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let hosts = hosts.as_array().unwrap();
    assert_eq!(hosts.len(), 3);
    assert_eq!(hosts[0]["name"], "local");
    assert_eq!(hosts[0]["environment"], "development");
    assert_eq!(hosts[1]["name"], "production");
    assert_eq!(hosts[1]["protected"], true);
    assert_eq!(hosts[2]["context"]["port"], 2222);
}

#[test]
fn test_config_is_found_from_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let nested = dir.path().join("web").join("app");
    std::fs::create_dir_all(&nested).unwrap();

    dbsync()
        .current_dir(&nested)
        .arg("hosts")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy@web1.library.ca"))
        .stdout(predicate::str::contains("staging.library.ca:2222"));
}

#[test]
fn test_explicit_config_path() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let elsewhere = tempfile::tempdir().unwrap();

    dbsync()
        .current_dir(elsewhere.path())
        .arg("--config")
        .arg(dir.path().join(".dbsync").join("config.toml"))
        .args(["hosts", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"production\""));
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    dbsync()
        .current_dir(dir.path())
        .arg("hosts")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("❌"))
        .stderr(predicate::str::contains(".dbsync/config.toml"));
}

#[test]
fn test_declined_push_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());

    dbsync()
        .current_dir(dir.path())
        .args(["db", "push", "production"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Are you sure to push the database to the production environment?",
        ))
        .stdout(predicate::str::contains("DB push aborted!"));
}

#[test]
fn test_push_to_unknown_host_fails() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());

    dbsync()
        .current_dir(dir.path())
        .args(["db", "push", "qa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown host `qa`"));
}
