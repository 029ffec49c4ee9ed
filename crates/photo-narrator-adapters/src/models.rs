//! Model downloading and caching adapter.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Placeholder checksum indicating verification should be skipped.
const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Environment variable overriding the default models directory.
pub const MODELS_DIR_ENV: &str = "PHOTO_NARRATOR_MODELS_DIR";

/// Name of the classifier weights entry.
pub const CLASSIFIER_MODEL: &str = "mobilenet_v1";
/// Name of the label list entry.
pub const LABELS_MODEL: &str = "imagenet_labels";

/// Download chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Download URL.
    pub url: &'static str,
    /// Expected SHA256 hash. All zeros skips verification.
    pub sha256: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: CLASSIFIER_MODEL,
        url: "https://github.com/photo-narrator/photo-narrator/releases/download/models-v1/mobilenet_v1.safetensors",
        // TODO: pin the hash once the models-v1 release assets are published
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "mobilenet_v1.safetensors",
    },
    ModelInfo {
        name: LABELS_MODEL,
        url: "https://github.com/photo-narrator/photo-narrator/releases/download/models-v1/imagenet_labels.txt",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "imagenet_labels.txt",
    },
];

/// Progress callback: model name, bytes downloaded, total bytes if known.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

/// Returns the default models directory.
///
/// Uses `$PHOTO_NARRATOR_MODELS_DIR` if set, otherwise
/// `XDG_DATA_HOME/photo-narrator/models` or `~/.local/share/photo-narrator/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(MODELS_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photo-narrator")
        .join("models")
}

/// Ensures all models are present in `dir`, downloading missing ones.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A model download fails
/// - A model's checksum doesn't match
pub fn ensure_models_with_progress(dir: &Path, progress: Option<&ProgressCallback>) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create models directory: {}", dir.display()))?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.exists() {
            debug!("Model {} already exists", model.name);
        } else {
            download_model(model, &path, progress)?;
        }
    }

    Ok(())
}

/// Downloads a model, verifying its checksum before moving it into place.
fn download_model(model: &ModelInfo, path: &Path, progress: Option<&ProgressCallback>) -> Result<()> {
    info!("Downloading model: {}", model.name);

    let mut response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        anyhow::bail!(
            "Download of {} failed with status: {}",
            model.name,
            response.status()
        );
    }

    let total = response.content_length();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut partial = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = response
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        partial
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", model.name))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(model.name, downloaded, total);
        }
    }

    let hash = format!("{:x}", hasher.finalize());
    verify_checksum(model, &hash)?;

    partial
        .persist(path)
        .with_context(|| format!("Failed to move {} into {}", model.name, path.display()))?;

    info!("Downloaded {} ({downloaded} bytes)", model.name);
    Ok(())
}

fn verify_checksum(model: &ModelInfo, hash: &str) -> Result<()> {
    if model.sha256 == PLACEHOLDER_CHECKSUM {
        debug!(
            "Skipping checksum verification for {} (placeholder checksum)",
            model.name
        );
        return Ok(());
    }
    if hash != model.sha256 {
        anyhow::bail!(
            "Checksum mismatch for {}: expected {}, got {hash}",
            model.name,
            model.sha256
        );
    }
    Ok(())
}

/// Returns the path to a model file inside `dir`.
#[must_use]
pub fn model_path(dir: &Path, name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| dir.join(m.filename))
}

/// Checks if all models are installed in `dir`.
#[must_use]
pub fn all_models_installed(dir: &Path) -> bool {
    MODELS.iter().all(|m| dir.join(m.filename).exists())
}

/// Lists models with their installed status.
#[must_use]
pub fn list_models(dir: &Path) -> Vec<(&'static ModelInfo, bool)> {
    MODELS
        .iter()
        .map(|m| (m, dir.join(m.filename).exists()))
        .collect()
}
