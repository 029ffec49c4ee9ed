//! Application state owned by the controller.

use super::{FailureKind, ImageRef, Prediction};

/// Where the controller is in the capture/classify/announce cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Runtime and model are loading; no user interaction yet.
    #[default]
    Initializing,
    /// Model loaded, no image selected.
    Ready,
    /// Waiting for the picker or camera.
    Acquiring,
    /// Image selected, classification in flight.
    Classifying,
    /// Predictions available for the current image.
    Done,
    /// The last step failed; see [`AppState::error`].
    Failed,
}

/// Snapshot of everything the UI renders.
///
/// Only the controller produces new values, one transition at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Current phase.
    pub phase: Phase,
    /// True once the numeric runtime is initialized.
    pub runtime_ready: bool,
    /// True once both the runtime and the classifier are loaded.
    pub model_ready: bool,
    /// Image the current predictions belong to.
    pub current_image: Option<ImageRef>,
    /// Predictions for `current_image`, in classifier order.
    pub predictions: Option<Vec<Prediction>>,
    /// Failure of the most recent step, if any.
    pub error: Option<FailureKind>,
    /// Request generation the state belongs to.
    pub generation: u64,
}

impl AppState {
    /// Returns true when the user may request a new image.
    #[must_use]
    pub const fn accepts_requests(&self) -> bool {
        self.model_ready
    }

    /// Returns true while a classification result is pending.
    #[must_use]
    pub fn is_predicting(&self) -> bool {
        self.phase == Phase::Classifying
    }

    /// Returns the predicted labels in order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.predictions
            .iter()
            .flatten()
            .map(|p| p.label.as_str())
            .collect()
    }
}
