//! Integration tests for the `fleetview` CLI binary.
//!
//! Argument parsing, help output, completions and exit codes run without
//! a server; the data commands run against a wiremock tracking server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use chrono::{TimeDelta, Utc};
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `fleetview` binary with env isolation.
///
/// Clears all `FLEETVIEW_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn fleetview_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fleetview");
    cmd.env("HOME", "/tmp/fleetview-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fleetview-cli-test-nonexistent")
        .env_remove("FLEETVIEW_PROFILE")
        .env_remove("FLEETVIEW_SERVER")
        .env_remove("FLEETVIEW_TOKEN")
        .env_remove("FLEETVIEW_OUTPUT")
        .env_remove("FLEETVIEW_INSECURE")
        .env_remove("FLEETVIEW_TIMEOUT")
        .env_remove("FLEETVIEW_SPEED_UNIT")
        .env_remove("FLEETVIEW_EMAIL")
        .env_remove("FLEETVIEW_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A tracking server with one moving truck and one parked van.
async fn fleet_server() -> MockServer {
    let server = MockServer::start().await;
    let fresh = (Utc::now() - TimeDelta::seconds(20)).to_rfc3339();

    Mock::given(method("GET"))
        .and(path("/api/server"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "geocoderEnabled": true
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Truck 1", "uniqueId": "T1", "status": "online",
              "positionId": 11, "category": "truck" },
            { "id": 2, "name": "Van 2", "uniqueId": "V2", "status": "online",
              "positionId": 12, "category": "pickup" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 11, "deviceId": 1, "fixTime": fresh, "latitude": 52.37, "longitude": 4.89,
              "speed": 30.0, "address": "Dam 1, Amsterdam",
              "attributes": { "motion": true, "batteryLevel": 95, "rssi": -80 } },
            { "id": 12, "deviceId": 2, "fixTime": fresh, "latitude": 51.92, "longitude": 4.47,
              "speed": 0.0, "attributes": { "motion": false, "ignition": false } }
        ])))
        .mount(&server)
        .await;

    server
}

/// Point the command at a config directory of its own.
fn with_config_dir(dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = fleetview_cmd();
    cmd.env("XDG_CONFIG_HOME", dir.path());
    cmd
}

fn with_server(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = fleetview_cmd();
    cmd.args(["--server", &server.uri(), "--token", "test-token"]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fleetview_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    fleetview_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("fleet")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("route"))
            .and(predicate::str::contains("address")),
    );
}

#[test]
fn test_version_flag() {
    fleetview_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetview"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    fleetview_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    fleetview_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = fleetview_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = fleetview_cmd()
        .args(["--output", "invalid", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("possible values"));
}

#[test]
fn test_zero_watch_interval_is_rejected() {
    let output = fleetview_cmd()
        .args(["watch", "--interval", "0s"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_devices_list_without_config() {
    fleetview_cmd()
        .args(["devices", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn test_unknown_profile() {
    fleetview_cmd()
        .args(["--profile", "nowhere", "summary"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn test_server_without_token() {
    fleetview_cmd()
        .args(["--server", "https://track.example.com", "summary"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("credentials"));
}

#[test]
fn test_config_show_no_config() {
    // `config show` renders the default config when no file exists.
    fleetview_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stale_after_secs = 120"));
}

#[test]
fn test_config_path() {
    fleetview_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_writes_profile() {
    let dir = tempfile::tempdir().unwrap();

    with_config_dir(&dir)
        .args(["config", "set", "server", "https://track.example.com"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("fleetview/config.toml")).unwrap();
    assert!(written.contains("https://track.example.com"), "{written}");

    with_config_dir(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("server = \"https://track.example.com\"")),
        );

    with_config_dir(&dir)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout("default *\n");
}

#[test]
fn test_config_set_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();

    with_config_dir(&dir)
        .args(["config", "set", "server", "not a url"])
        .assert()
        .code(2);
    with_config_dir(&dir)
        .args(["config", "set", "colour", "red"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
    assert!(!dir.path().join("fleetview/config.toml").exists());
}

#[test]
fn test_config_use_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();

    with_config_dir(&dir)
        .args(["config", "use", "elsewhere"])
        .assert()
        .code(4);
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_profile_from_config_file() {
    let server = fleet_server().await;
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("fleetview");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "default_profile = \"depot\"\n\n\
             [profiles.depot]\n\
             server = \"{}\"\n\
             token_env = \"FLEET_CLI_TEST_TOKEN\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let output = with_config_dir(&dir)
        .env("FLEET_CLI_TEST_TOKEN", "test-token")
        .args(["summary", "-o", "json-compact"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_json() {
    let server = fleet_server().await;

    let output = with_server(&server)
        .args(["devices", "list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["device"]["name"], "Truck 1");
    assert_eq!(rows[0]["live"]["status"], "moving");
    assert_eq!(rows[1]["live"]["status"], "stopped");
    assert_eq!(rows[1]["icon"], "car");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_filter_plain() {
    let server = fleet_server().await;

    with_server(&server)
        .args(["devices", "list", "--status", "moving", "-o", "plain"])
        .assert()
        .success()
        .stdout("1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_card_uses_recorded_address() {
    let server = fleet_server().await;

    let output = with_server(&server)
        .args(["status", "Truck 1", "-o", "json", "--speed-unit", "kn"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let card: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(card["status"], "moving");
    assert_eq!(card["address"]["text"], "Dam 1, Amsterdam");
    assert_eq!(card["address"]["source"], "original");
    assert_eq!(card["battery"], "Full");
    assert_eq!(card["signal_bars"], 3);
    assert_eq!(card["speed"]["value"], 30.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_unknown_device() {
    let server = fleet_server().await;

    with_server(&server)
        .args(["status", "ghost"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("ghost"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_address_with_original_needs_no_geocoder() {
    let server = fleet_server().await;

    with_server(&server)
        .args(["address", "52.1", "-4.3", "--original", "123 Main St", "-o", "plain"])
        .assert()
        .success()
        .stdout("123 Main St\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_summary_counts() {
    let server = fleet_server().await;

    let output = with_server(&server)
        .args(["summary", "-o", "json-compact"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["moving"], 1);
    assert_eq!(summary["stopped"], 1);
    assert_eq!(summary["offline"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/server"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    fleetview_cmd()
        .args(["--server", &server.uri(), "--token", "wrong", "summary"])
        .assert()
        .code(3);
}
