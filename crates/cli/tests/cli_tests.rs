//! CLI integration tests

use std::process::{Command, Output};
use tempfile::TempDir;

fn wtp(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wtp"))
        .args(args)
        .env_remove("WTP_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = wtp(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Wait Time Predictor"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("predict-image"), "Should show predict-image command");
    assert!(stdout.contains("train"), "Should show train command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("simulate"), "Should show simulate command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = wtp(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("wtp"), "Should show binary name");
}

#[test]
fn test_predict_help() {
    let output = wtp(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--queue-size"));
    assert!(stdout.contains("--service-time"));
    assert!(stdout.contains("--arrival-rate"));
}

#[test]
fn test_train_help() {
    let output = wtp(&["train", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--model-type"));
    assert!(stdout.contains("--local"));
}

#[test]
fn test_predict_requires_service_time() {
    let output = wtp(&["predict", "--queue-size", "10"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--service-time"));
}

#[test]
fn test_simulate_writes_dataset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("queue.csv");
    let output = wtp(&[
        "--format",
        "json",
        "simulate",
        "--output",
        path.to_str().unwrap(),
        "--samples",
        "25",
        "--seed",
        "7",
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["rows"], 25);

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("queue_size,avg_service_time,arrival_rate,wait_time_seconds")
    );
    assert_eq!(lines.count(), 25);
}

#[test]
fn test_local_train_rejects_unknown_model_type() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.json");
    let output = wtp(&[
        "train",
        "--local",
        "--model-type",
        "bogus",
        "--data-path",
        dir.path().join("queue.csv").to_str().unwrap(),
        "--model-path",
        model_path.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(!model_path.exists());
}

#[test]
fn test_local_train_writes_model() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.json");
    let output = wtp(&[
        "--format",
        "json",
        "train",
        "--local",
        "--data-path",
        dir.path().join("queue.csv").to_str().unwrap(),
        "--model-path",
        model_path.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "success");
    assert_eq!(report["model_type"], "linear");
    assert!(model_path.exists());
}
