//! Core domain types for photo classification and announcement.

mod failure;
mod image;
mod prediction;
mod state;

pub use failure::{ControllerError, FailureKind};
pub use image::{AcquireOptions, Acquisition, ImageRef, ImageSourceKind, MediaTypes};
pub use prediction::Prediction;
pub use state::{AppState, Phase};
