// enshunter/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command isolated from the developer's environment and config files.
fn enshunter(workdir: &Path, home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("enshunter").unwrap();
    cmd.current_dir(workdir)
        .env("HOME", home)
        .env_remove("INFURA_KEY")
        .env_remove("RUST_LOG")
        .env_remove("ENSHUNTER_RPC_URL")
        .env_remove("ENSHUNTER_WORKERS")
        .env_remove("ENSHUNTER_RATE_LIMIT")
        .env_remove("ENSHUNTER_RETRIES")
        .env_remove("ENSHUNTER_TIMEOUT")
        .env_remove("ENSHUNTER_CONFIG")
        .env_remove("WORKERS")
        .env_remove("RATE_LIMIT")
        .env_remove("RETRIES")
        .env_remove("TIMEOUT");
    cmd
}

fn workspace_with_input(names: &[&str]) -> (TempDir, TempDir) {
    let workdir = tempdir().unwrap();
    let home = tempdir().unwrap();
    fs::write(workdir.path().join("esn.txt"), names.join("\n")).unwrap();
    (workdir, home)
}

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
}

fn bool_word(value: bool) -> String {
    format!("0x{:064x}", value as u8)
}

#[test]
fn test_help_lists_flags() {
    let mut cmd = Command::cargo_bin("enshunter").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--infura"))
        .stdout(predicate::str::contains("--input"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("--rate"))
        .stdout(predicate::str::contains("--retries"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--save-config"));
}

#[test]
fn test_missing_credential_is_fatal() {
    let (workdir, home) = workspace_with_input(&["alice"]);

    enshunter(workdir.path(), home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Infura Project ID is required"))
        .stderr(predicate::str::contains("Hint:").not());
}

#[test]
fn test_empty_input_is_fatal() {
    let (workdir, home) = workspace_with_input(&["", "   ", ""]);

    enshunter(workdir.path(), home.path())
        .args(["--infura", "test-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No identifiers found"));
}

#[test]
fn test_missing_input_file_is_fatal() {
    let workdir = tempdir().unwrap();
    let home = tempdir().unwrap();

    enshunter(workdir.path(), home.path())
        .args(["--infura", "test-key", "--input", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input file"));
}

#[test]
fn test_invalid_worker_count_rejected() {
    let (workdir, home) = workspace_with_input(&["alice"]);

    enshunter(workdir.path(), home.path())
        .args(["--infura", "test-key", "--workers", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Workers must be between 1 and 100"));
}

#[test]
fn test_malformed_config_file_is_fatal() {
    let (workdir, home) = workspace_with_input(&["alice"]);
    fs::write(workdir.path().join("enshunter.toml"), "[defaults\nworkers = ").unwrap();

    enshunter(workdir.path(), home.path())
        .args(["--infura", "test-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse TOML"));
}

#[test]
fn test_credential_from_dotenv_file() {
    let (workdir, home) = workspace_with_input(&["alice"]);
    // Unreachable endpoint: getting past the credential check is enough.
    fs::write(
        workdir.path().join(".env"),
        "ENSHUNTER_RPC_URL=http://127.0.0.1:9\n",
    )
    .unwrap();

    enshunter(workdir.path(), home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect to Ethereum"))
        .stderr(predicate::str::contains("Hint:"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_scan_against_mock_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_chainId" })))
        .respond_with(rpc_result(json!("0x1")))
        .mount(&server)
        .await;
    // "alice" is free, everything else is taken.
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .and(body_string_contains("616c696365"))
        .respond_with(rpc_result(json!(bool_word(true))))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .respond_with(rpc_result(json!(bool_word(false))))
        .mount(&server)
        .await;

    let (workdir, home) = workspace_with_input(&["alice", "", "bob.eth", "carol"]);
    let mut cmd = enshunter(workdir.path(), home.path());
    cmd.args([
        "--rpc-url",
        &server.uri(),
        "--workers",
        "2",
        "--rate",
        "1",
        "--timeout",
        "20",
        "--save-config",
        "--verbose",
    ]);

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("Scan completed!"))
        .stdout(predicate::str::contains("alice.eth is available"))
        .stdout(predicate::str::contains("bob.eth is not available"))
        .stdout(predicate::str::contains("Errors: 0"));

    let output = fs::read_to_string(workdir.path().join("ens_available.txt")).unwrap();
    assert_eq!(output, "alice.eth\n");

    let saved = fs::read_to_string(home.path().join(".enshunter").join("config.toml")).unwrap();
    assert!(saved.contains("workers = 2"));
    assert!(saved.contains("rate_limit = 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_endpoint_counts_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_chainId" })))
        .respond_with(rpc_result(json!("0x1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (workdir, home) = workspace_with_input(&["alice", "bob"]);
    let mut cmd = enshunter(workdir.path(), home.path());
    cmd.args([
        "--rpc-url",
        &server.uri(),
        "--rate",
        "1",
        "--retries",
        "1",
    ]);

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("Errors: 2"))
        .stdout(predicate::str::contains("Available names: 0"));

    let output = fs::read_to_string(workdir.path().join("ens_available.txt")).unwrap();
    assert!(output.is_empty());
}
