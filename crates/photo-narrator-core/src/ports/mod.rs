//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the controller and the
//! external collaborators: model runtime, picker/camera, decoder and speech.

mod announcer;
mod events;
mod image_acquirer;
mod image_decoder;
mod model_loader;

pub use announcer::Announcer;
pub use events::{ControllerEvent, EventSink};
pub use image_acquirer::ImageAcquirer;
pub use image_decoder::ImageDecoder;
pub use model_loader::{Classifier, ModelLoader};
