//! Application controller: the capture/classify/announce state machine.
//!
//! The controller owns the [`AppState`](crate::domain::AppState), turns every
//! collaborator completion into a [`Transition`], and notifies
//! [`EventSink`](crate::ports::EventSink) observers such as [`Announcement`].

mod announcement;
mod app;
mod transition;

pub use announcement::{Announcement, DEFAULT_INTRO};
pub use app::{Controller, PendingClassification};
pub use transition::{reduce, Transition};
