//! Integration tests for the myflow binary
//!
//! These drive the compiled CLI and check exit codes and stream output.

use std::process::Command;
use tempfile::tempdir;

/// Run the CLI and capture (exit code, stdout, stderr)
fn run_cli(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_myflow"))
        .args(args)
        .output()
        .unwrap();

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

#[test]
fn test_config_init_at_custom_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("newcfg").join("my.toml");
    let path_str = path.to_str().unwrap();

    let (code, stdout, _) = run_cli(&["--config", path_str, "config", "--init"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Config written"));
    assert!(path.exists());

    let (code, stdout, _) = run_cli(&["--config", path_str, "config"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("study_cap_minutes"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("my.toml");
    std::fs::write(&path, "[load]\nsleep_penalty_weight = 2.0\n").unwrap();

    let (code, _, stderr) = run_cli(&["--config", path.to_str().unwrap(), "config", "--init"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[load]\nsleep_penalty_weight = 2.0\n"
    );
}

#[test]
fn test_missing_log_reported_once() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();
    let missing = dir.path().join("missing.json");

    let (code, stdout, stderr) = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "pacing",
        missing.to_str().unwrap(),
    ]);

    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert_eq!(stderr.matches("Could not read your tracking log").count(), 1);
}

#[test]
fn test_pacing_prints_json() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();
    let log = dir.path().join("log.json");
    std::fs::write(
        &log,
        r#"[{"date":"2024-03-01","emotional":{"stress":3}},{"date":"2024-03-02","emotional":{"stress":4}}]"#,
    )
    .unwrap();

    let (code, stdout, _) = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "pacing",
        log.to_str().unwrap(),
    ]);

    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["state"], "INSUFFICIENT_DATA");
}
