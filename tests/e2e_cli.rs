//! CLI end-to-end tests
//!
//! Tests for the reelhook command-line interface against a throwaway
//! database.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the reelhook binary with no TMDB key in scope.
#[allow(deprecated)]
fn reelhook_cmd() -> Command {
    let mut cmd = Command::cargo_bin("reelhook").unwrap();
    cmd.env_remove("TMDB_API_KEY").env_remove("RUST_LOG");
    cmd
}

/// Write a config pointing the database into `dir`.
fn write_config(dir: &Path) -> PathBuf {
    let config_path = dir.join("reelhook.toml");
    let db_path = dir.join("catalog.db");
    fs::write(
        &config_path,
        format!(
            "[database]\npath = {:?}\n\n[notifications]\nlog = false\n",
            db_path.to_string_lossy()
        ),
    )
    .unwrap();
    config_path
}

#[test]
fn test_cli_no_args_shows_help() {
    reelhook_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    reelhook_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelhook"));
}

#[test]
fn test_cli_parse_json() {
    reelhook_cmd()
        .args(["parse", "Breaking.Bad.S01E05.720p.mkv", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"series_episode\""))
        .stdout(predicate::str::contains("\"title\": \"Breaking Bad\""))
        .stdout(predicate::str::contains("\"episode\": 5"));
}

#[test]
fn test_cli_parse_rejects_untitled() {
    reelhook_cmd()
        .args(["parse", "1080p.x264.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no title"));
}

#[test]
fn test_cli_ingest_replay_and_list() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .args(["ingest", "Xyzabc123.2021.720p.mkv", "--media-ref", "file-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accepted: Xyzabc123"))
        .stdout(predicate::str::contains("New record: true"));

    let events = dir.path().join("events.jsonl");
    fs::write(
        &events,
        concat!(
            r#"{"filename":"Xyzabc123.2021.720p.mkv","mediaReference":"file-2"}"#,
            "\n",
            r#"{"filename":"Xyzabc123.2021.1080p.mkv","mediaReference":"file-3"}"#,
            "\n",
            "not json\n",
            r#"{"filename":"1080p.mkv","mediaReference":"file-4"}"#,
            "\n",
        ),
    )
    .unwrap();

    reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg(&events)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 accepted, 2 rejected, 0 failed"));

    reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .args(["list", "--unresolved"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Xyzabc123 [unresolved]"))
        .stdout(predicate::str::contains("(2 variants)"))
        .stdout(predicate::str::contains("1 records"));
}

#[test]
fn test_cli_resolve_with_title_and_notify() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    let output = reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .args(["ingest", "Pathan.2023.720p.mkv", "--media-ref", "file-1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["status"], "accepted");
    let id = outcome["contentId"].as_str().unwrap().to_string();

    reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .args(["resolve", &id, "--title", "Pathaan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed: Pathaan"))
        .stdout(predicate::str::contains("still unresolved"));

    reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .args(["notify", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Announced: Pathaan [720p]"));
}

#[test]
fn test_cli_show_unknown_id_fails() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .args(["show", "00000000-0000-0000-0000-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Content not found"));

    reelhook_cmd()
        .arg("--config")
        .arg(&config)
        .args(["show", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid content id"));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    reelhook_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("TMDB key: not set"));
}
