//! CLI integration tests

use std::process::{Command, Output};

fn fleetctl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fleetctl"))
        .args(args)
        .env_remove("FLEETCTL_API_URL")
        .env("HOME", "/nonexistent-fleetctl-home")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

const FLEET_BODY: &str = r#"{
    "nodes": [
        {"id": 1, "total_mb": 1200, "used_mb": 900, "utilization_percent": 75.0},
        {"id": 2, "total_mb": 2048, "used_mb": 512, "utilization_percent": 25.0}
    ],
    "generated_at": 1700000000
}"#;

const NODE_BODY: &str = r#"{
    "id": 1, "total_mb": 1200, "used_mb": 900, "utilization_percent": 75.0,
    "history": [1000.0, 1000.0, 1000.0],
    "forecast_mb": 1000.0,
    "window": 10
}"#;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = fleetctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Predictive Memory Autoscaler"),
        "Should show app name"
    );
    assert!(stdout.contains("nodes"), "Should show nodes command");
    assert!(stdout.contains("node"), "Should show node command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("FLEETCTL_API_URL"), "Should show env var");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = fleetctl(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("fleetctl"), "Should show binary name");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = fleetctl(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should show error message");
}

/// Test missing node id
#[test]
fn test_node_requires_id() {
    let output = fleetctl(&["node"]);

    assert!(!output.status.success(), "Missing argument should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("required") || stderr.contains("error"));
}

#[test]
fn test_nodes_table() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/v1/nodes")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(FLEET_BODY)
        .create();

    let output = fleetctl(&["--api-url", &server.url(), "nodes"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    mock.assert();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Node"));
    assert!(stdout.contains("1.17Gi"));
    assert!(stdout.contains("75.0%"));
    assert!(stdout.contains("2 nodes"));
}

#[test]
fn test_nodes_json() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v1/nodes")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(FLEET_BODY)
        .create();

    let output = fleetctl(&["--api-url", &server.url(), "--format", "json", "nodes"]);

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["nodes"][1]["total_mb"], 2048);
}

#[test]
fn test_node_detail() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v1/nodes/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(NODE_BODY)
        .create();

    let output = fleetctl(&["--api-url", &server.url(), "node", "1"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Node 01"));
    assert!(stdout.contains("1000 → 1000 → 1000"));
    assert!(stdout.contains("3/10 samples"));
    assert!(stdout.contains("1000MB"));
}

#[test]
fn test_unknown_node_fails() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v1/nodes/42")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "node 42 not found"}"#)
        .create();

    let output = fleetctl(&["--api-url", &server.url(), "node", "42"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("node 42 not found"));
}

#[test]
fn test_health_reports_unavailable_service() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/healthz")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"status": "unhealthy", "components": {
                "controller": {"status": "unhealthy", "message": "stopped", "last_check_timestamp": 0}
            }}"#,
        )
        .create();
    server
        .mock("GET", "/readyz")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ready": false, "reason": "Critical component unhealthy"}"#)
        .create();

    let output = fleetctl(&["--api-url", &server.url(), "health"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("unhealthy"));
    assert!(stdout.contains("not ready"));
    assert!(stdout.contains("Critical component unhealthy"));
    assert!(stdout.contains("controller"));
}

#[test]
fn test_unreachable_api_fails() {
    let output = fleetctl(&["--api-url", "http://127.0.0.1:1", "nodes"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to send request"));
}
