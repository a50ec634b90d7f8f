use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn cargo_bin(dir: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reqlab").expect("binary exists");
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("REQLAB_DATA_FILE")
        .env_remove("REQLAB_REQUEST_TIMEOUT_SECONDS")
        .env_remove("REQLAB_HISTORY_MAX_ITEMS");
    cmd
}

#[test]
fn displays_help() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin(&temp);
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Personal API testing workbench"));
}

#[test]
fn displays_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin(&temp);
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn errors_when_request_file_missing() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin(&temp);
    cmd.args(["run", "missing.json"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn runs_request_and_records_history() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ping").query_param("v", "1");
        then.status(200)
            .header("content-type", "application/json")
            .body("{\"ok\":true}");
    });

    cargo_bin(&temp)
        .args(["--data", "store.json", "run", "--url"])
        .arg(server.url("/ping"))
        .args(["-q", "v=1", "--expect-status", "200", "--expect-key", "ok"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:"))
        .stdout(predicate::str::contains("2/2 passed"));
    mock.assert();

    temp.child("store.json").assert(predicate::path::exists());

    cargo_bin(&temp)
        .args(["--data", "store.json", "history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#1"))
        .stdout(predicate::str::contains("/ping"));
}

#[test]
fn runs_request_file_with_environment() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/items")
            .header("x-team", "core")
            .json_body(serde_json::json!({"name": "widget"}));
        then.status(201);
    });

    cargo_bin(&temp)
        .args(["--data", "store.json", "env", "add", "dev", "--base-url"])
        .arg(server.base_url())
        .args(["--var", "team=core", "--var", "item=widget"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created environment #1"));

    temp.child("create.json")
        .write_str(
            r#"{
  "method": "post",
  "url": "/items",
  "headers": {"X-Team": "{{team}}"},
  "body_type": "json",
  "body": {"name": "{{item}}"},
  "tests": [{"type": "status_code", "expected": 201}],
  "env_id": 1
}"#,
        )
        .unwrap();

    cargo_bin(&temp)
        .args(["--data", "store.json", "run", "create.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/1 passed"));
    mock.assert();
}

#[test]
fn activates_environment_and_lists_it() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("vars.env")
        .write_str("TOKEN=abc\nREGION=eu\n")
        .unwrap();

    cargo_bin(&temp)
        .args(["--data", "store.json", "env", "import", "imported", "vars.env"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with 2 variables"));

    cargo_bin(&temp)
        .args(["--data", "store.json", "env", "activate", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("imported"));

    cargo_bin(&temp)
        .args(["--data", "store.json", "env", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* #1 imported"));
}

#[test]
fn unknown_history_entry_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    cargo_bin(&temp)
        .args(["--data", "store.json", "history", "show", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("history 7 not found"));
}
