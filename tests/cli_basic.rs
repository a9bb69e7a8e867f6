//! Integration tests for basic CLI behavior.
//!
//! Everything here fails or succeeds before any network request is made.

#![allow(deprecated)] // cargo_bin deprecation — replacement not yet stable

use assert_cmd::Command;
use predicates::prelude::*;

const SHOW_URL: &str = "https://iview.abc.net.au/show/gruen";

/// Helper: get a Command for the `vodgrab` binary.
fn vodgrab() -> Command {
    Command::cargo_bin("vodgrab").expect("binary 'vodgrab' should be built")
}

/// Helper: an empty config file so the user's own config is never read.
fn empty_config() -> tempfile::NamedTempFile {
    tempfile::NamedTempFile::new().expect("temp config")
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    vodgrab()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: vodgrab"))
        .stdout(predicate::str::contains("--episode"))
        .stdout(predicate::str::contains("--season"))
        .stdout(predicate::str::contains("--quality"));
}

#[test]
fn version_flag_shows_semver() {
    vodgrab()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^vodgrab \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn missing_url_is_usage_error() {
    vodgrab()
        .assert()
        .failure()
        .stderr(predicate::str::contains("<URL>"));
}

#[test]
fn conflicting_selection_flags_rejected() {
    vodgrab()
        .args([SHOW_URL, "--complete", "--season", "S01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ─── Unsupported modes ───────────────────────────────────────────────────────

#[test]
fn remote_cdm_not_supported() {
    vodgrab()
        .args([SHOW_URL, "--complete", "--remote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Remote CDM is not supported"));
}

#[test]
fn subtitle_only_not_supported() {
    vodgrab()
        .args([SHOW_URL, "--complete", "--sub-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Subtitle-only download is not supported"));
}

// ─── Argument validation ─────────────────────────────────────────────────────

#[test]
fn bad_episode_selector_rejected() {
    vodgrab()
        .args([SHOW_URL, "--episode", "E03"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid selection"));
}

#[test]
fn missing_explicit_config_is_error() {
    vodgrab()
        .args([SHOW_URL, "--titles", "--config", "/nonexistent/vodgrab.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn foreign_url_rejected() {
    let config = empty_config();
    vodgrab()
        .args(["https://example.com/show/gruen", "--titles", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not an ABC iview URL"));
}
