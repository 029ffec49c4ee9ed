//! Controller event port for UI and side-effect integration.

use crate::domain::{AppState, FailureKind, ImageRef, Prediction};

/// Events emitted by the controller after a transition is applied.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// State changed; carries the new snapshot.
    StateChanged(AppState),
    /// Predictions went from absent to present.
    PredictionsReady {
        /// Image the predictions belong to.
        image: ImageRef,
        /// Predictions in classifier order.
        predictions: Vec<Prediction>,
    },
    /// A pipeline step failed.
    Failed {
        /// What went wrong.
        failure: FailureKind,
    },
}

/// Port for receiving controller events.
pub trait EventSink: Send + Sync {
    /// Called once per emitted event, in emission order.
    fn on_event(&self, event: ControllerEvent);
}
