//! Synthetic image and model builders for testing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use photo_narrator_core::inference::{MobileNet, MobileNetConfig};

/// Builder for creating synthetic test images.
///
/// Images are generated in memory and written to disk in the format implied
/// by the file extension.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates a solid-color image.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| Rgb([r, g, b])))
    }

    /// Creates a black and white checkerboard.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> DynamicImage {
        let cell = cell_size.max(1);
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        }))
    }

    /// Writes `image` to `dir/name`, choosing the format from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unknown or the write fails.
    pub fn write(dir: &Path, name: &str, image: &DynamicImage) -> Result<PathBuf> {
        let path = dir.join(name);
        let format = ImageFormat::from_path(&path)
            .with_context(|| format!("Unknown image format: {name}"))?;
        image
            .save_with_format(&path, format)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Writes a 32x32 solid-color JPEG.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn jpeg(dir: &Path, name: &str) -> Result<PathBuf> {
        Self::write(dir, name, &Self::rgb_uniform(32, 32, 180, 120, 60))
    }

    /// Writes a file with an image extension but non-image contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn corrupt(dir: &Path, name: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, b"definitely not an image")
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Paths of a model fixture written by [`write_tiny_mobilenet`].
#[derive(Debug, Clone)]
pub struct ModelFixture {
    /// Safetensors weights.
    pub weights: PathBuf,
    /// Label list, one per line.
    pub labels: PathBuf,
}

/// Writes a width-0.25 MobileNet with all-zero weights plus its labels.
///
/// Zero weights give every class the same probability, so predictions come
/// back in label order. File names match the model registry, so `dir` can be
/// used as a models directory.
///
/// # Errors
///
/// Returns an error if the network cannot be built or the files written.
pub fn write_tiny_mobilenet(dir: &Path, labels: &[&str]) -> Result<ModelFixture> {
    let config = MobileNetConfig {
        width_multiplier: 0.25,
        num_classes: labels.len(),
    };

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    MobileNet::new(config, vb)?;
    for var in varmap.all_vars() {
        var.set(&var.zeros_like()?)?;
    }

    let weights = dir.join("mobilenet_v1.safetensors");
    varmap
        .save(&weights)
        .with_context(|| format!("Failed to write {}", weights.display()))?;

    let labels_path = dir.join("imagenet_labels.txt");
    std::fs::write(&labels_path, labels.join("\n"))
        .with_context(|| format!("Failed to write {}", labels_path.display()))?;

    Ok(ModelFixture {
        weights,
        labels: labels_path,
    })
}
