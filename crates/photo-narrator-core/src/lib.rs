//! Photo Narrator Core - Domain logic, controller and inference
//!
//! This crate contains the domain types, the ports to external collaborators,
//! the application controller state machine, and a candle-based MobileNet
//! image classifier.

pub mod controller;
pub mod domain;
pub mod inference;
pub mod ports;

pub use controller::{Announcement, Controller, PendingClassification, Transition};
pub use domain::{
    AcquireOptions, Acquisition, AppState, ControllerError, FailureKind, ImageRef,
    ImageSourceKind, MediaTypes, Phase, Prediction,
};
pub use ports::{
    Announcer, Classifier, ControllerEvent, EventSink, ImageAcquirer, ImageDecoder, ModelLoader,
};
