//! Status line rendering for interactive mode.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use photo_narrator_core::{AppState, ControllerEvent, EventSink, Phase};
use tracing::warn;

/// Key hint shown once the model is loaded.
pub const MENU: &str = "[g] Choose image  [c] Take Photo  [q] Quit";

/// Renders controller state changes as status lines.
///
/// Clones share the writer, so one clone can be registered as a sink while
/// another prints prompts.
#[derive(Clone)]
pub struct StatusLine {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    last_phase: Arc<Mutex<Phase>>,
}

impl StatusLine {
    /// Creates a status line on the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            last_phase: Arc::new(Mutex::new(Phase::Initializing)),
        }
    }

    /// Prints a line verbatim.
    pub fn print(&self, line: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!("Failed to write status: {e}");
        }
    }

    fn render(&self, state: &AppState) {
        let previous = {
            let mut last = self.last_phase.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *last, state.phase)
        };

        match state.phase {
            // Runtime up, model still loading.
            Phase::Initializing => {}
            Phase::Ready if previous == Phase::Initializing => {
                self.print("Loaded");
                self.print(MENU);
            }
            Phase::Ready => self.print("Cancelled"),
            Phase::Acquiring => {}
            Phase::Classifying => self.print("Predictions: Predicting..."),
            Phase::Done => self.print(&format!("Predictions: {}", state.labels().join(", "))),
            Phase::Failed => {
                if let Some(error) = &state.error {
                    self.print(&format!("Error: {error}"));
                }
            }
        }
    }
}

impl EventSink for StatusLine {
    fn on_event(&self, event: ControllerEvent) {
        if let ControllerEvent::StateChanged(state) = event {
            self.render(&state);
        }
    }
}
