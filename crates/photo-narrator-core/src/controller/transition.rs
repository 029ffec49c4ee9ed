//! State transition records and the pure reducer that applies them.

use crate::domain::{AppState, FailureKind, ImageRef, Phase, Prediction};

/// An immutable record of something that happened.
///
/// Every async completion is turned into one of these and applied to the
/// state in a single assignment. Request-scoped transitions carry the
/// generation of the request that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The numeric runtime finished initializing.
    RuntimeReady,
    /// The classifier finished loading.
    ModelLoaded,
    /// Runtime or classifier loading failed.
    ModelFailed(FailureKind),
    /// A new acquisition request began.
    AcquisitionStarted {
        /// Generation of the new request.
        generation: u64,
    },
    /// The user dismissed the picker or camera.
    AcquisitionCancelled {
        /// Generation of the request.
        generation: u64,
    },
    /// The picker or camera failed.
    AcquisitionFailed {
        /// Generation of the request.
        generation: u64,
        /// What went wrong.
        failure: FailureKind,
    },
    /// An image was selected; classification starts.
    ImageAcquired {
        /// Generation of the request.
        generation: u64,
        /// The selected image.
        image: ImageRef,
    },
    /// Classification finished.
    Classified {
        /// Generation of the request.
        generation: u64,
        /// Image that was classified.
        image: ImageRef,
        /// Predictions, or the failure that prevented them.
        outcome: Result<Vec<Prediction>, FailureKind>,
    },
}

impl Transition {
    /// Returns the request generation, for request-scoped transitions.
    #[must_use]
    pub const fn generation(&self) -> Option<u64> {
        match self {
            Self::RuntimeReady | Self::ModelLoaded | Self::ModelFailed(_) => None,
            Self::AcquisitionStarted { generation }
            | Self::AcquisitionCancelled { generation }
            | Self::AcquisitionFailed { generation, .. }
            | Self::ImageAcquired { generation, .. }
            | Self::Classified { generation, .. } => Some(*generation),
        }
    }

    /// Returns the failure carried by this transition, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&FailureKind> {
        match self {
            Self::ModelFailed(failure) | Self::AcquisitionFailed { failure, .. } => Some(failure),
            Self::Classified {
                outcome: Err(failure),
                ..
            } => Some(failure),
            _ => None,
        }
    }
}

/// Computes the state that follows `state` after `transition`.
///
/// Returns `None` when the transition is stale: it belongs to an older
/// request generation, or to an image that is no longer current.
#[must_use]
pub fn reduce(state: &AppState, transition: Transition) -> Option<AppState> {
    let current = state.generation;

    match transition {
        Transition::RuntimeReady => Some(AppState {
            runtime_ready: true,
            ..state.clone()
        }),
        Transition::ModelLoaded => Some(AppState {
            phase: Phase::Ready,
            runtime_ready: true,
            model_ready: true,
            error: None,
            ..state.clone()
        }),
        Transition::ModelFailed(failure) => Some(AppState {
            phase: Phase::Failed,
            model_ready: false,
            error: Some(failure),
            ..state.clone()
        }),
        Transition::AcquisitionStarted { generation } => {
            (generation > current).then(|| AppState {
                phase: Phase::Acquiring,
                current_image: None,
                predictions: None,
                error: None,
                generation,
                ..state.clone()
            })
        }
        Transition::AcquisitionCancelled { generation } => {
            (generation == current).then(|| AppState {
                phase: Phase::Ready,
                current_image: None,
                predictions: None,
                ..state.clone()
            })
        }
        Transition::AcquisitionFailed {
            generation,
            failure,
        } => (generation == current).then(|| AppState {
            phase: Phase::Failed,
            current_image: None,
            predictions: None,
            error: Some(failure),
            ..state.clone()
        }),
        Transition::ImageAcquired { generation, image } => {
            (generation == current).then(|| AppState {
                phase: Phase::Classifying,
                current_image: Some(image),
                predictions: None,
                ..state.clone()
            })
        }
        Transition::Classified {
            generation,
            image,
            outcome,
        } => {
            if generation != current || state.current_image.as_ref() != Some(&image) {
                return None;
            }
            Some(match outcome {
                Ok(predictions) => AppState {
                    phase: Phase::Done,
                    predictions: Some(predictions),
                    error: None,
                    ..state.clone()
                },
                Err(failure) => AppState {
                    phase: Phase::Failed,
                    predictions: None,
                    error: Some(failure),
                    ..state.clone()
                },
            })
        }
    }
}
