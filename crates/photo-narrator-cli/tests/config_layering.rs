//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use photo_narrator_test_support::{write_tiny_mobilenet, SyntheticImageBuilder};
use predicates::prelude::*;
use tempfile::TempDir;

const PROJECT_CONFIG: &str = ".photo-narrator.toml";

/// A temp dir holding models, one image, and an isolated XDG config home.
fn setup() -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let models = temp.path().join("models");
    fs::create_dir_all(&models).unwrap();
    write_tiny_mobilenet(&models, &["cat", "dog", "bird", "fish"]).unwrap();
    let image = SyntheticImageBuilder::jpeg(temp.path(), "photo.jpg").unwrap();
    (temp, image)
}

fn cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("photo-narrator").unwrap();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env_remove("PHOTO_NARRATOR_MODELS_DIR");
    cmd
}

fn write_project_config(dir: &Path, contents: &str) {
    let contents = format!(
        "[models]\ndir = {:?}\n\n{contents}",
        dir.join("models").display().to_string()
    );
    fs::write(dir.join(PROJECT_CONFIG), contents).unwrap();
}

#[test]
fn test_project_config_sets_models_dir() {
    let (temp, image) = setup();
    write_project_config(temp.path(), "[speech]\nenabled = false\n");

    cmd(temp.path())
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("photo.jpg: cat"));
}

#[test]
fn test_project_config_sets_format() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[speech]\nenabled = false\n\n[output]\nformat = \"json\"\n",
    );

    let output = cmd(temp.path()).arg(&image).output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_format_overrides_project_config() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[speech]\nenabled = false\n\n[output]\nformat = \"json\"\n",
    );

    cmd(temp.path())
        .args(["--format", "text"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[").not());
}

#[test]
fn test_project_config_top_k() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[general]\ntop_k = 1\n\n[speech]\nenabled = false\n",
    );

    cmd(temp.path())
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("photo.jpg: cat (25.0%)\n"));
}

#[test]
fn test_cli_top_k_overrides_project_config() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[general]\ntop_k = 1\n\n[speech]\nenabled = false\n",
    );

    cmd(temp.path())
        .args(["--top-k", "2"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("cat (25.0%), dog (25.0%)\n"));
}

#[test]
fn test_speech_disabled_writes_transcript() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[speech]\nenabled = false\nintro = \"Could be\"\n",
    );

    cmd(temp.path())
        .arg(&image)
        .assert()
        .success()
        .stderr(predicate::str::contains("say: Could be\nsay: cat"));
}

#[test]
fn test_cli_intro_overrides_project_config() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[speech]\nenabled = false\nintro = \"Could be\"\n",
    );

    cmd(temp.path())
        .args(["--intro", "Surely"])
        .arg(&image)
        .assert()
        .success()
        .stderr(predicate::str::contains("say: Surely").and(predicate::str::contains("Could be").not()));
}

#[test]
fn test_missing_speech_program_falls_back_to_transcript() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[speech]\ncommand = \"definitely-not-a-speech-program\"\n",
    );

    cmd(temp.path())
        .arg(&image)
        .assert()
        .success()
        .stderr(
            predicate::str::contains("not found")
                .and(predicate::str::contains("say: I think it may be")),
        );
}

#[test]
fn test_xdg_config_used_without_project_config() {
    let (temp, image) = setup();
    let xdg = temp.path().join("xdg/photo-narrator");
    fs::create_dir_all(&xdg).unwrap();
    fs::write(
        xdg.join("config.toml"),
        format!(
            "[models]\ndir = {:?}\n\n[speech]\nenabled = false\n\n[output]\nformat = \"jsonl\"\n",
            temp.path().join("models").display().to_string()
        ),
    )
    .unwrap();

    cmd(temp.path())
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_overrides_xdg() {
    let (temp, image) = setup();
    let xdg = temp.path().join("xdg/photo-narrator");
    fs::create_dir_all(&xdg).unwrap();
    fs::write(
        xdg.join("config.toml"),
        "[output]\nformat = \"jsonl\"\n\n[speech]\nenabled = false\n",
    )
    .unwrap();
    write_project_config(temp.path(), "[output]\nformat = \"text\"\n");

    cmd(temp.path())
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("photo.jpg: cat"))
        .stderr(predicate::str::contains("say: cat"));
}

#[test]
fn test_invalid_config_value_warns() {
    let (temp, image) = setup();
    write_project_config(
        temp.path(),
        "[speech]\nenabled = false\n\n[output]\nformat = \"xml\"\n",
    );

    cmd(temp.path())
        .arg(&image)
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"));
}

#[test]
fn test_device_config_and_flag_run_on_cpu() {
    let (temp, image) = setup();
    write_project_config(temp.path(), "[general]\ndevice = \"cpu\"\n");

    cmd(temp.path())
        .args(["--mute", "-v"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("photo.jpg: cat"))
        .stderr(predicate::str::contains("Using CPU for inference"));

    write_project_config(temp.path(), "");
    cmd(temp.path())
        .args(["--mute", "--cpu", "-v"])
        .arg(&image)
        .assert()
        .success()
        .stderr(predicate::str::contains("Using CPU for inference"));
}
