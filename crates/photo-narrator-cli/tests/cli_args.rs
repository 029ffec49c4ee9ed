//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd(temp: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("photo-narrator").unwrap();
    cmd.current_dir(temp.path())
        .env("XDG_CONFIG_HOME", temp.path())
        .env_remove("PHOTO_NARRATOR_MODELS_DIR");
    cmd
}

// === Missing/Invalid Path Tests ===

#[test]
fn test_missing_path_shows_error() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

#[test]
fn test_classify_subcommand_requires_paths() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .arg("classify")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

// === Value Validation Tests ===

#[test]
fn test_invalid_format_rejected() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .args(["--format", "xml", "photo.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'xml'"));
}

#[test]
fn test_zero_top_k_rejected() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .args(["--top-k", "0", "photo.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1"));
}

#[test]
fn test_non_numeric_top_k_rejected() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .args(["--top-k", "many", "photo.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--top-k"));
}

#[test]
fn test_invalid_camera_command_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .args(["--camera-command", "imagesnap", "--mute", "photo.jpg"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("{output}"));
}

// === Help and Version ===

#[test]
fn test_help_lists_subcommands() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("classify")
                .and(predicate::str::contains("interactive"))
                .and(predicate::str::contains("models")),
        );
}

#[test]
fn test_version() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// === Models Command ===

#[test]
fn test_models_path_uses_flag() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("weights");

    cmd(&temp)
        .args(["models", "path", "--models-dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(dir.display().to_string()));
}

#[test]
fn test_models_path_uses_env() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("from-env");

    cmd(&temp)
        .env("PHOTO_NARRATOR_MODELS_DIR", &dir)
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(dir.display().to_string()));
}

#[test]
fn test_models_list_empty_dir() {
    let temp = tempfile::tempdir().unwrap();

    cmd(&temp)
        .args(["models", "list", "--models-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("mobilenet_v1")
                .and(predicate::str::contains("imagenet_labels"))
                .and(predicate::str::contains("0/2 models installed")),
        );
}

#[test]
fn test_models_list_with_fixture() {
    let temp = tempfile::tempdir().unwrap();
    photo_narrator_test_support::write_tiny_mobilenet(temp.path(), &["cat", "dog"]).unwrap();

    cmd(&temp)
        .args(["models", "list", "--models-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2/2 models installed"));
}

#[test]
fn test_models_requires_subcommand() {
    let temp = tempfile::tempdir().unwrap();
    cmd(&temp).arg("models").assert().failure();
}
