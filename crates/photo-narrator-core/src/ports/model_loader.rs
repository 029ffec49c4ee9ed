//! Model loading and classification ports.

use std::sync::Arc;

use candle_core::Tensor;

use crate::domain::Prediction;

/// A loaded image classifier.
pub trait Classifier: Send + Sync {
    /// Classifies a decoded image tensor.
    ///
    /// # Arguments
    ///
    /// * `image` - `(3, height, width)` f32 tensor with values in `[0, 255]`
    ///
    /// # Returns
    ///
    /// Predictions ordered by descending confidence.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn classify(&self, image: &Tensor) -> anyhow::Result<Vec<Prediction>>;
}

/// Port for initializing the numeric runtime and loading a classifier.
pub trait ModelLoader: Send + Sync {
    /// Initializes the numeric runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable runtime is available.
    fn ready(&self) -> anyhow::Result<()>;

    /// Loads the pretrained classifier.
    ///
    /// # Errors
    ///
    /// Returns an error if weights or labels cannot be loaded.
    fn load(&self) -> anyhow::Result<Arc<dyn Classifier>>;
}
