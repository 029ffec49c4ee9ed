//! Pipeline integration tests using a tiny classifier and synthetic images.
//!
//! The classifier has zeroed weights, so every label scores the same and the
//! top predictions come back in label-file order.

#![allow(clippy::unwrap_used, clippy::expect_used, deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use photo_narrator_test_support::{write_tiny_mobilenet, SyntheticImageBuilder};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const LABELS: &[&str] = &["cat", "dog", "bird", "fish", "frog"];

struct Workspace {
    dir: TempDir,
    models: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir_all(&models).unwrap();
        write_tiny_mobilenet(&models, LABELS).unwrap();
        Self { dir, models }
    }

    fn image(&self, name: &str) -> PathBuf {
        SyntheticImageBuilder::jpeg(self.dir.path(), name).unwrap()
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("photo-narrator").unwrap();
        cmd.current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path())
            .env_remove("PHOTO_NARRATOR_MODELS_DIR")
            .arg("--models-dir")
            .arg(&self.models)
            .arg("--mute");
        cmd
    }
}

fn parse_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn labels(record: &Value) -> Vec<&str> {
    record["predictions"]
        .as_array()
        .expect("record has predictions")
        .iter()
        .map(|p| p["label"].as_str().unwrap())
        .collect()
}

// === Classification ===

#[test]
fn test_classifies_image_in_label_order() {
    let ws = Workspace::new();
    let image = ws.image("photo.jpg");

    let output = ws
        .command()
        .arg("--format")
        .arg("jsonl")
        .arg(&image)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let records = parse_lines(&output.stdout);
    assert_eq!(records.len(), 1);
    assert_eq!(labels(&records[0]), ["cat", "dog", "bird"]);

    let confidence = records[0]["predictions"][0]["confidence"].as_f64().unwrap();
    assert!((confidence - 0.2).abs() < 1e-4, "got {confidence}");
}

#[test]
fn test_text_output_lists_percentages() {
    let ws = Workspace::new();
    let image = ws.image("photo.jpg");

    ws.command()
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("cat (20.0%), dog (20.0%), bird (20.0%)"));
}

#[test]
fn test_explicit_classify_subcommand() {
    let ws = Workspace::new();
    let image = ws.image("photo.jpg");

    let mut cmd = Command::cargo_bin("photo-narrator").unwrap();
    cmd.current_dir(ws.path())
        .env("XDG_CONFIG_HOME", ws.path())
        .arg("classify")
        .arg("--models-dir")
        .arg(&ws.models)
        .arg("--mute")
        .arg(&image);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("photo.jpg: cat"));
}

#[test]
fn test_top_k_limits_predictions() {
    let ws = Workspace::new();
    let image = ws.image("photo.jpg");

    let output = ws
        .command()
        .args(["--format", "jsonl", "--top-k", "5"])
        .arg(&image)
        .output()
        .unwrap();

    let records = parse_lines(&output.stdout);
    assert_eq!(labels(&records[0]), LABELS);
}

#[test]
fn test_images_classified_in_argument_order() {
    let ws = Workspace::new();
    let first = ws.image("first.jpg");
    let second = ws.image("second.jpg");

    let output = ws
        .command()
        .args(["--format", "jsonl"])
        .arg(&first)
        .arg(&second)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let records = parse_lines(&output.stdout);
    assert_eq!(records.len(), 2);
    assert!(records[0]["image"].as_str().unwrap().ends_with("first.jpg"));
    assert!(records[1]["image"].as_str().unwrap().ends_with("second.jpg"));
}

// === Announcement ===

#[test]
fn test_intro_spoken_before_labels() {
    let ws = Workspace::new();
    let image = ws.image("photo.jpg");

    let output = ws.command().arg(&image).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    let spoken: Vec<&str> = stderr
        .lines()
        .filter_map(|line| line.strip_prefix("say: "))
        .collect();
    assert_eq!(spoken, ["I think it may be", "cat", "dog", "bird"]);
}

#[test]
fn test_custom_intro() {
    let ws = Workspace::new();
    let image = ws.image("photo.jpg");

    ws.command()
        .args(["--intro", "Looks like"])
        .arg(&image)
        .assert()
        .success()
        .stderr(predicate::str::contains("say: Looks like\nsay: cat"));
}

#[test]
fn test_each_image_announced() {
    let ws = Workspace::new();
    let first = ws.image("first.jpg");
    let second = ws.image("second.jpg");

    let output = ws.command().arg(&first).arg(&second).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(stderr.matches("say: I think it may be").count(), 2);
}

// === Failures ===

#[test]
fn test_corrupt_image_reports_error() {
    let ws = Workspace::new();
    let corrupt = SyntheticImageBuilder::corrupt(ws.path(), "broken.jpg").unwrap();

    let output = ws
        .command()
        .args(["--format", "jsonl"])
        .arg(&corrupt)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let records = parse_lines(&output.stdout);
    assert_eq!(records.len(), 1);
    assert!(records[0].get("predictions").is_none());
    assert!(records[0]["error"]
        .as_str()
        .unwrap()
        .contains("could not decode image"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("say: "), "nothing should be spoken: {stderr}");
}

#[test]
fn test_missing_file_reports_error() {
    let ws = Workspace::new();

    ws.command()
        .arg(ws.path().join("nowhere.jpg"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "nowhere.jpg: error: image acquisition failed",
        ));
}

#[test]
fn test_failure_does_not_stop_later_images() {
    let ws = Workspace::new();
    let corrupt = SyntheticImageBuilder::corrupt(ws.path(), "broken.jpg").unwrap();
    let good = ws.image("good.jpg");

    let output = ws
        .command()
        .args(["--format", "jsonl"])
        .arg(&corrupt)
        .arg(&good)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let records = parse_lines(&output.stdout);
    assert_eq!(records.len(), 2);
    assert!(records[0]["error"].is_string());
    assert_eq!(labels(&records[1]), ["cat", "dog", "bird"]);
}

#[test]
fn test_missing_models_is_fatal() {
    let ws = Workspace::new();
    let image = ws.image("photo.jpg");

    let mut cmd = Command::cargo_bin("photo-narrator").unwrap();
    cmd.current_dir(ws.path())
        .env("XDG_CONFIG_HOME", ws.path())
        .arg("--models-dir")
        .arg(ws.path().join("empty"))
        .arg("--mute")
        .arg(&image);

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("models fetch"));
}
