//! MobileNet v1 image classifier.
//!
//! Depthwise-separable CNN trained on ImageNet. Batch-norm is expected to be
//! folded into the convolution biases when the weights are exported, so every
//! convolution carries a bias and is followed directly by ReLU6.
//!
//! Weight layout:
//! - `stem.{weight,bias}` 3x3 stride-2 convolution
//! - `blocks.{i}.depthwise.{weight,bias}` 3x3 depthwise convolution
//! - `blocks.{i}.pointwise.{weight,bias}` 1x1 convolution
//! - `classifier.{weight,bias}` linear head

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::{load_tensors, select_device, top_k, DevicePreference, Labels};
use crate::domain::Prediction;
use crate::ports::{Classifier, ModelLoader};

/// Input resolution the network expects.
pub const INPUT_SIZE: usize = 224;

/// Number of predictions returned by default.
pub const DEFAULT_TOP_K: usize = 3;

/// Output channels and stride of the 13 depthwise-separable blocks.
const BLOCKS: [(usize, usize); 13] = [
    (64, 1),
    (128, 2),
    (128, 1),
    (256, 2),
    (256, 1),
    (512, 2),
    (512, 1),
    (512, 1),
    (512, 1),
    (512, 1),
    (512, 1),
    (1024, 2),
    (1024, 1),
];

/// Network hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MobileNetConfig {
    /// Channel width multiplier (alpha).
    pub width_multiplier: f32,
    /// Number of output classes.
    pub num_classes: usize,
}

impl Default for MobileNetConfig {
    fn default() -> Self {
        Self {
            width_multiplier: 1.0,
            num_classes: 1000,
        }
    }
}

impl MobileNetConfig {
    fn channels(&self, base: usize) -> usize {
        ((base as f32 * self.width_multiplier) as usize).max(8)
    }

    /// Reads the width multiplier and class count off the classifier head.
    ///
    /// # Errors
    ///
    /// Returns an error if `classifier.weight` is missing or not 2-D.
    pub fn from_weights(tensors: &HashMap<String, Tensor>) -> Result<Self> {
        let head = tensors
            .get("classifier.weight")
            .context("Weights have no classifier.weight")?;
        let (num_classes, features) = head
            .dims2()
            .context("classifier.weight must be (classes, features)")?;
        Ok(Self {
            width_multiplier: features as f32 / 1024.0,
            num_classes,
        })
    }
}

struct SeparableBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
}

impl Module for SeparableBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = relu6(&self.depthwise.forward(x)?)?;
        relu6(&self.pointwise.forward(&x)?)
    }
}

fn relu6(x: &Tensor) -> candle_core::Result<Tensor> {
    x.clamp(0f32, 6f32)
}

/// MobileNet v1 network.
pub struct MobileNet {
    stem: Conv2d,
    blocks: Vec<SeparableBlock>,
    classifier: Linear,
}

impl MobileNet {
    /// Builds the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(config: MobileNetConfig, vb: VarBuilder) -> Result<Self> {
        let mut in_channels = config.channels(32);
        let stem = conv2d(
            3,
            in_channels,
            3,
            Conv2dConfig {
                padding: 1,
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("stem"),
        )
        .context("Failed to load stem")?;

        let mut blocks = Vec::with_capacity(BLOCKS.len());
        for (i, &(out, stride)) in BLOCKS.iter().enumerate() {
            let out_channels = config.channels(out);
            let vb = vb.pp(format!("blocks.{i}"));

            let depthwise = conv2d(
                in_channels,
                in_channels,
                3,
                Conv2dConfig {
                    padding: 1,
                    stride,
                    groups: in_channels,
                    ..Conv2dConfig::default()
                },
                vb.pp("depthwise"),
            )
            .with_context(|| format!("Failed to load block {i} depthwise"))?;

            let pointwise = conv2d(
                in_channels,
                out_channels,
                1,
                Conv2dConfig::default(),
                vb.pp("pointwise"),
            )
            .with_context(|| format!("Failed to load block {i} pointwise"))?;

            blocks.push(SeparableBlock {
                depthwise,
                pointwise,
            });
            in_channels = out_channels;
        }

        let classifier = linear(in_channels, config.num_classes, vb.pp("classifier"))
            .context("Failed to load classifier head")?;

        Ok(Self {
            stem,
            blocks,
            classifier,
        })
    }
}

impl Module for MobileNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut x = relu6(&self.stem.forward(x)?)?;
        for block in &self.blocks {
            x = block.forward(&x)?;
        }
        // Global average pool: (B, C, H, W) -> (B, C)
        let x = x.mean((2, 3))?;
        self.classifier.forward(&x)
    }
}

/// Scales a `(3, H, W)` tensor in `[0, 255]` to the `(1, 3, 224, 224)` network
/// input in `[-1, 1]`.
///
/// # Errors
///
/// Returns an error if the tensor is not a 3-channel image.
pub fn preprocess(image: &Tensor, device: &Device) -> Result<Tensor> {
    let dims = image.dims();
    if dims.len() != 3 || dims[0] != 3 {
        anyhow::bail!("Expected a (3, height, width) image tensor, got {dims:?}");
    }

    let x = image
        .to_device(device)?
        .unsqueeze(0)?
        .upsample_nearest2d(INPUT_SIZE, INPUT_SIZE)?
        .affine(1.0 / 127.5, -1.0)?;
    Ok(x)
}

/// MobileNet paired with its labels, returning the top-k predictions.
pub struct MobileNetClassifier {
    model: MobileNet,
    labels: Labels,
    device: Device,
    top_k: usize,
}

impl MobileNetClassifier {
    /// Wraps a network with its labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the label count does not match the network output.
    pub fn new(
        model: MobileNet,
        config: MobileNetConfig,
        labels: Labels,
        device: Device,
        top_k: usize,
    ) -> Result<Self> {
        if labels.len() != config.num_classes {
            anyhow::bail!(
                "Label count {} does not match model classes {}",
                labels.len(),
                config.num_classes
            );
        }
        Ok(Self {
            model,
            labels,
            device,
            top_k: top_k.max(1),
        })
    }
}

impl Classifier for MobileNetClassifier {
    fn classify(&self, image: &Tensor) -> Result<Vec<Prediction>> {
        let input = preprocess(image, &self.device)?;
        let logits = self.model.forward(&input)?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        top_k(&probs, self.top_k)
            .into_iter()
            .map(|(index, p)| -> Result<Prediction> {
                let label = self
                    .labels
                    .get(index)
                    .with_context(|| format!("No label for class {index}"))?;
                Ok(Prediction::new(label, p))
            })
            .collect()
    }
}

/// Loads MobileNet weights and labels from disk.
pub struct MobileNetLoader {
    weights: PathBuf,
    labels: PathBuf,
    config: Option<MobileNetConfig>,
    preference: DevicePreference,
    top_k: usize,
    device: OnceCell<Device>,
    classifier: OnceCell<Arc<MobileNetClassifier>>,
}

impl MobileNetLoader {
    /// Creates a loader for the given weight and label files.
    #[must_use]
    pub fn new(weights: impl Into<PathBuf>, labels: impl Into<PathBuf>) -> Self {
        Self {
            weights: weights.into(),
            labels: labels.into(),
            config: None,
            preference: DevicePreference::Auto,
            top_k: DEFAULT_TOP_K,
            device: OnceCell::new(),
            classifier: OnceCell::new(),
        }
    }

    /// Sets the network configuration instead of reading it off the weights.
    #[must_use]
    pub const fn with_config(mut self, config: MobileNetConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the device preference.
    #[must_use]
    pub const fn with_device(mut self, preference: DevicePreference) -> Self {
        self.preference = preference;
        self
    }

    /// Sets how many predictions are returned.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    fn device(&self) -> &Device {
        self.device.get_or_init(|| select_device(self.preference))
    }
}

impl ModelLoader for MobileNetLoader {
    fn ready(&self) -> Result<()> {
        for path in [&self.weights, &self.labels] {
            if !path.exists() {
                anyhow::bail!(
                    "{} not found. Run `photo-narrator models fetch`.",
                    path.display()
                );
            }
        }
        let device = self.device();
        debug!("Runtime ready on {device:?}");
        Ok(())
    }

    fn load(&self) -> Result<Arc<dyn Classifier>> {
        let classifier = self.classifier.get_or_try_init(|| {
            let device = self.device().clone();
            let labels = Labels::from_file(&self.labels)?;
            let tensors = load_tensors(&self.weights, &device)?;
            let config = match self.config {
                Some(config) => config,
                None => MobileNetConfig::from_weights(&tensors)?,
            };
            let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
            let model = MobileNet::new(config, vb)?;
            info!(
                "Loaded MobileNet (width {}, {} classes) from {}",
                config.width_multiplier,
                labels.len(),
                self.weights.display()
            );
            MobileNetClassifier::new(model, config, labels, device, self.top_k).map(Arc::new)
        })?;
        Ok(Arc::clone(classifier) as Arc<dyn Classifier>)
    }
}
