//! Classification prediction type.

use serde::{Deserialize, Serialize};

/// A single label predicted by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable class label.
    pub label: String,
    /// Confidence from 0.0 to 1.0.
    pub confidence: f32,
}

impl Prediction {
    /// Creates a new prediction, clamping the confidence into `[0, 1]`.
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            label: label.into(),
            confidence,
        }
    }
}
