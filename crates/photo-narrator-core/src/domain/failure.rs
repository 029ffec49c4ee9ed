//! Failure kinds surfaced into application state.

use thiserror::Error;

/// Why a step of the pipeline failed.
///
/// Failures are recorded in [`AppState::error`](super::AppState) and rendered,
/// rather than only logged.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// The numeric runtime or the classifier could not be loaded.
    #[error("model failed to load: {0}")]
    ModelLoad(String),
    /// The picker or camera failed (not a cancellation).
    #[error("image acquisition failed: {0}")]
    Acquisition(String),
    /// Image bytes could not be read.
    #[error("could not read image: {0}")]
    Read(String),
    /// Image bytes could not be decoded into a tensor.
    #[error("could not decode image: {0}")]
    Decode(String),
    /// The classifier returned an error.
    #[error("classification failed: {0}")]
    Classify(String),
}

impl FailureKind {
    /// Builds a failure from an error chain, keeping every context layer.
    pub fn from_error(wrap: fn(String) -> Self, error: &anyhow::Error) -> Self {
        wrap(format!("{error:#}"))
    }
}

/// Errors caused by using the controller out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// A request was made before the model finished loading.
    #[error("model is not loaded yet")]
    NotReady,
}
