//! Announcement observer: speaks predictions when they appear.

use std::sync::Arc;

use tracing::debug;

use crate::ports::{Announcer, ControllerEvent, EventSink};

/// Phrase spoken before the predicted labels.
pub const DEFAULT_INTRO: &str = "I think it may be";

/// Event sink that speaks every new set of predictions.
///
/// For each `PredictionsReady` event the announcer is called once with the
/// intro phrase and then once per label, in prediction order.
pub struct Announcement {
    announcer: Arc<dyn Announcer>,
    intro: String,
}

impl Announcement {
    /// Creates an observer speaking through `announcer` with the default intro.
    #[must_use]
    pub fn new(announcer: Arc<dyn Announcer>) -> Self {
        Self {
            announcer,
            intro: DEFAULT_INTRO.to_string(),
        }
    }

    /// Replaces the intro phrase.
    #[must_use]
    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = intro.into();
        self
    }
}

impl EventSink for Announcement {
    fn on_event(&self, event: ControllerEvent) {
        if let ControllerEvent::PredictionsReady { image, predictions } = event {
            debug!("Announcing {} predictions for {image}", predictions.len());
            self.announcer.speak(&self.intro);
            for prediction in &predictions {
                self.announcer.speak(&prediction.label);
            }
        }
    }
}
