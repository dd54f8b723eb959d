//! Integration tests for basic CLI behavior.
//!
//! Every test points `--config-dir` at a temporary directory so the user's
//! real configuration is never read or written. None of them touch the network.

#![allow(deprecated)] // Command::cargo_bin

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper: get a Command for the `panplay` binary using `dir` for configuration.
fn panplay(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("panplay").expect("binary 'panplay' should be built");
    cmd.arg("--config-dir").arg(dir);
    cmd
}

fn write_sites(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("sites.json");
    std::fs::write(&path, json).unwrap();
    path
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: panplay"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("detail"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_flag_shows_semver() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^panplay \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path()).arg("stream").assert().failure();
}

// ─── config ──────────────────────────────────────────────────────────────────

#[test]
fn config_show_prints_defaults() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search concurrency: 3"))
        .stdout(predicate::str::contains("Current site: (none)"))
        .stdout(predicate::str::contains("quark: not configured"));
}

#[test]
fn set_concurrency_is_clamped_and_saved() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["config", "set-concurrency", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search concurrency: 1"));

    let saved = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(saved.contains("concurrency_limit = 1"));

    panplay(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search concurrency: 1"));
}

#[test]
fn set_cookie_writes_drive_file() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["config", "set-cookie", "quark", "a=1; __puus=x"])
        .assert()
        .success();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("quark.json")).unwrap()).unwrap();
    assert_eq!(saved["cookie"], "a=1; __puus=x");

    panplay(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quark: configured"));
}

#[test]
fn set_cookie_rejects_unknown_drive() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["config", "set-cookie", "dropbox", "a=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown drive"));
}

// ─── search ──────────────────────────────────────────────────────────────────

#[test]
fn search_without_catalog_fails() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["search", "dune"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no site catalog configured"));
}

#[test]
fn search_over_placeholder_sites_is_empty() {
    let dir = TempDir::new().unwrap();
    let sites = write_sites(
        dir.path(),
        r#"{"sites":[{"key":"p","name":"Placeholder","api":"","type":2,"searchable":1}]}"#,
    );
    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["search", "dune"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 results from 1/1 sites (0 failed)"));
}

#[test]
fn search_json_output_is_an_array() {
    let dir = TempDir::new().unwrap();
    let sites = write_sites(dir.path(), r#"{"sites":[]}"#);
    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["search", "dune", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn empty_keyword_fails() {
    let dir = TempDir::new().unwrap();
    let sites = write_sites(dir.path(), r#"{"sites":[]}"#);
    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["search", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("search keyword is empty"));
}

#[test]
fn unknown_site_type_fails_only_that_site() {
    let dir = TempDir::new().unwrap();
    let sites = write_sites(
        dir.path(),
        r#"{"sites":[
            {"key":"x","name":"X","type":9,"searchable":1},
            {"key":"p","name":"P","type":2,"searchable":1}
        ]}"#,
    );
    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["search", "dune"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 results from 1/2 sites (1 failed)"))
        .stderr(predicate::str::contains("unsupported type"));
}

// ─── detail / play ───────────────────────────────────────────────────────────

#[test]
fn detail_on_placeholder_site_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let sites = write_sites(dir.path(), r#"{"sites":[{"key":"p","name":"P","type":2}]}"#);
    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["detail", "1", "--site", "p"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported for type 2"));
}

#[test]
fn detail_without_site_fails() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["detail", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no site selected"));
}

#[test]
fn detail_uses_current_site() {
    let dir = TempDir::new().unwrap();
    let sites = write_sites(dir.path(), r#"{"sites":[{"key":"p","name":"Pholder","type":2}]}"#);
    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["config", "set-site", "p"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current site: Pholder (p)"));

    let saved = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(saved.contains(r#"current_site = "p""#));
    assert!(!saved.contains("sites_file"));

    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["detail", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported for type 2"));
}

#[test]
fn set_site_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let sites = write_sites(dir.path(), r#"{"sites":[{"key":"p","name":"P","type":2}]}"#);
    panplay(dir.path())
        .arg("--sites")
        .arg(&sites)
        .args(["config", "set-site", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no site with key"));
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn play_direct_link_prints_player_info() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["play", "direct", "https://cdn.example/v/movie.mp4"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type": "mp4""#))
        .stdout(predicate::str::contains("https://cdn.example/v/movie.mp4"));
}

#[test]
fn play_unimplemented_drive_fails() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["play", "ali", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ali drive is not implemented"));
}

#[test]
fn play_quark_without_cookie_is_not_configured() {
    let dir = TempDir::new().unwrap();
    panplay(dir.path())
        .args(["play", "quarknormal#01", "f++t++s++st"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quark is not configured"));
}
