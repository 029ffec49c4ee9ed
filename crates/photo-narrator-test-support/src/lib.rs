//! Test support utilities for photo-narrator.
//!
//! Provides mocks for every controller port, synthetic image builders, and a
//! tiny MobileNet fixture for end-to-end tests.
//!
//! # Example
//!
//! ```
//! use photo_narrator_core::{Controller, ImageSourceKind};
//! use photo_narrator_test_support::{MockAcquirer, MockClassifier, MockDecoder, MockModelLoader};
//! use std::sync::Arc;
//!
//! let loader = MockModelLoader::new(MockClassifier::labels(&["cat", "dog"]));
//! let acquirer = MockAcquirer::new().selecting("file:///img1.jpg");
//! let mut controller = Controller::new(
//!     Box::new(loader),
//!     Box::new(acquirer),
//!     Arc::new(MockDecoder::new()),
//! );
//!
//! controller.startup().unwrap();
//! let state = controller.request_and_classify(ImageSourceKind::Gallery).unwrap();
//! assert_eq!(state.labels(), ["cat", "dog"]);
//! ```

mod builders;
mod mocks;

pub use builders::{write_tiny_mobilenet, ModelFixture, SyntheticImageBuilder};
pub use mocks::{
    predictions, AcquireCall, MockAcquirer, MockClassifier, MockDecoder, MockEventSink,
    MockModelLoader, RecordingAnnouncer,
};
