// Runs the docstats binary against a scratch database
use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn docstats(dir: &TempDir, args: &[&str]) -> Output {
    let database = dir.path().join("stats.db");
    Command::new(env!("CARGO_BIN_EXE_docstats"))
        .arg("--database")
        .arg(&database)
        .arg("--no-color")
        .args(args)
        .env("DOCSTATS_CONFIG", dir.path().join("missing.toml"))
        .env_remove("DOCSTATS_ACCESS_TOKEN")
        .output()
        .expect("Failed to execute docstats")
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_docstats"))
        .arg("--help")
        .output()
        .expect("Failed to execute docstats");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for command in ["sweep", "rebuild", "day", "days", "calendar", "words"] {
        assert!(stdout.contains(command), "help is missing '{}': {}", command, stdout);
    }
}

#[test]
fn test_words_json() {
    let dir = TempDir::new().unwrap();
    let text = dir.path().join("draft.txt");
    fs::write(&text, "Drafts draft DRAFT drafting. Draft again!").unwrap();

    let output = docstats(&dir, &["--json", "words", text.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total"], 6);
    assert_eq!(json["words"][0]["word"], "draft");
    assert_eq!(json["words"][0]["count"], 3);
}

#[test]
fn test_empty_database_queries() {
    let dir = TempDir::new().unwrap();

    let days = docstats(&dir, &["--json", "days"]);
    assert!(days.status.success(), "stderr: {}", String::from_utf8_lossy(&days.stderr));
    let json: serde_json::Value = serde_json::from_slice(&days.stdout).unwrap();
    assert_eq!(json, serde_json::json!([]));

    let day = docstats(&dir, &["day", "2024-01-01"]);
    assert!(day.status.success());
    assert!(String::from_utf8_lossy(&day.stdout).contains("No activity recorded on 2024-01-01"));

    let file = docstats(&dir, &["file", "nope"]);
    assert!(!file.status.success());
    assert!(String::from_utf8_lossy(&file.stderr).contains("not in the database"));
}

#[test]
fn test_sweep_requires_token() {
    let dir = TempDir::new().unwrap();
    let output = docstats(&dir, &["sweep"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No access token"));
}

#[test]
fn test_invalid_day_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = docstats(&dir, &["day", "someday"]);
    assert!(!output.status.success());
}
