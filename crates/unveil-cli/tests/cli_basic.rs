//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Every test
//! points `--config` at a temporary file so the user's config is untouched.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return output.
fn run_cli(config: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "unveil-cli", "--"])
        .args(args)
        .arg("--config")
        .arg(config)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn temp_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

#[test]
fn test_gate_inside_window() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(&config, &["gate", "--at", "2026-01-20T12:00:00"]);
    assert_eq!(code, 0, "gate failed");
    assert!(stdout.contains("State: revealed"));
    assert!(stdout.contains("Window: January 20"));
}

#[test]
fn test_gate_json_outside_window() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(&config, &["gate", "--at", "2026-01-21", "--json"]);
    assert_eq!(code, 0, "gate --json failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["unlocked"], false);
    assert_eq!(parsed["next_occurrence"], "2027-01-20T00:00:00");
}

#[test]
fn test_countdown_one_second_before() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(&config, &["countdown", "--at", "2026-01-19T23:59:59"]);
    assert_eq!(code, 0, "countdown failed");
    assert_eq!(stdout.trim(), "00d 00:00:01");
}

#[test]
fn test_countdown_inside_window_is_unlocked() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(&config, &["countdown", "--at", "2026-01-20T08:00"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "unlocked");
}

#[test]
fn test_invalid_timestamp_fails() {
    let (_dir, config) = temp_config();
    let (code, _, stderr) = run_cli(&config, &["countdown", "--at", "soon"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("invalid timestamp"));
}

#[test]
fn test_config_set_get_reset() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(&config, &["config", "set", "gate.day", "14"]);
    assert_eq!(code, 0, "config set failed");
    assert_eq!(stdout.trim(), "ok");

    let (_, stdout, _) = run_cli(&config, &["config", "get", "gate.day"]);
    assert_eq!(stdout.trim(), "14");

    let (code, _, stderr) = run_cli(&config, &["config", "set", "gate.day", "40"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (code, _, _) = run_cli(&config, &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&config, &["config", "get", "gate.day"]);
    assert_eq!(stdout.trim(), "20");
}

#[test]
fn test_config_unknown_key_fails() {
    let (_dir, config) = temp_config();
    let (code, _, stderr) = run_cli(&config, &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_simulate_sample_page_reveals() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(
        &config,
        &[
            "simulate",
            "--at",
            "2026-01-20T10:00:00",
            "--seed",
            "1",
            "--scroll",
            "7000:2500",
        ],
    );
    assert_eq!(code, 0, "simulate failed");
    assert!(stdout.contains("State: Revealed"));
    assert!(stdout.contains("loading finished"));
    assert!(stdout.contains("effects started"));
}

#[test]
fn test_simulate_json_lines() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(
        &config,
        &["simulate", "--at", "2026-01-10", "--seed", "1", "--json"],
    );
    assert_eq!(code, 0);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(events
        .iter()
        .any(|e| e["type"] == "state_changed" && e["to"] == "locked"));
    assert!(events.iter().any(|e| e["type"] == "countdown_ticked"));
}

#[test]
fn test_watch_stops_after_max_ticks() {
    let (_dir, config) = temp_config();
    let (code, stdout, _) = run_cli(
        &config,
        &["watch", "--at", "2026-01-10T00:00:00", "--max-ticks", "1"],
    );
    assert_eq!(code, 0, "watch failed");
    // The clock starts running before the first tick is taken.
    let line = stdout.trim();
    assert!(line == "10d 00:00:00" || line.starts_with("09d 23:59:5"), "{line}");
}
