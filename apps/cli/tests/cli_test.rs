//! Integration tests for the `wpt` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command isolated from the developer's ~/.waypoint/config.toml.
fn wpt(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wpt").unwrap();
    cmd.env("HOME", home.path());
    cmd
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    wpt(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("agent"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("seed"));
}

#[test]
fn test_seed_creates_database() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("data").join("flights.db");

    wpt(&home)
        .arg("seed")
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 18"));

    assert!(Path::new(&db).exists());
}

#[test]
fn test_seed_twice_does_not_duplicate() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("flights.db");

    wpt(&home).arg("seed").arg("--db").arg(&db).assert().success();
    wpt(&home)
        .arg("seed")
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 18"));
}

#[test]
fn test_ask_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    let config = write_config(
        &home,
        r#"
[waypoint.model]
api_key_env = "WAYPOINT_TEST_MISSING_KEY"
"#,
    );

    wpt(&home)
        .env_remove("WAYPOINT_TEST_MISSING_KEY")
        .arg("--config")
        .arg(&config)
        .arg("ask")
        .arg("Flights from LHR to CDG on 2024-07-01?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WAYPOINT_TEST_MISSING_KEY"));
}

#[test]
fn test_agent_without_endpoint_fails() {
    let home = TempDir::new().unwrap();

    wpt(&home)
        .arg("agent")
        .arg("Flights to Rome?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("endpoint not configured"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let home = TempDir::new().unwrap();
    let config = write_config(
        &home,
        r"
[tool_use]
max_iterations = 0
",
    );

    wpt(&home)
        .arg("--config")
        .arg(&config)
        .arg("seed")
        .arg("--db")
        .arg(home.path().join("flights.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_iterations"));
}

#[test]
fn test_ask_prints_run_record() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"content":[{"type":"text","text":"No flights are needed to say hello."}],
                "stop_reason":"end_turn","usage":{"input_tokens":12,"output_tokens":9}}"#,
        )
        .create();

    let home = TempDir::new().unwrap();
    let config = write_config(
        &home,
        &format!(
            r#"
[waypoint.model]
base_url = "{}/v1"
api_key_env = "WAYPOINT_TEST_KEY"

[waypoint.retry]
max_retries = 0
"#,
            server.url()
        ),
    );

    wpt(&home)
        .env("WAYPOINT_TEST_KEY", "test-key")
        .arg("--config")
        .arg(&config)
        .arg("ask")
        .arg("Hello")
        .arg("--max-iterations")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("No flights are needed to say hello."))
        .stdout(predicate::str::contains("\"iteration_count\": 1"));

    mock.assert();
}
