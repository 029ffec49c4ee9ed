//! Photo Narrator Adapters - External adapters for photo-narrator.
//!
//! This crate provides adapters for:
//! - Filesystem image reading and decoding
//! - Gallery and camera image acquisition
//! - Speech output
//! - Model downloading and caching

pub mod acquirer;
pub mod camera;
pub mod decoder;
pub mod gallery;
pub mod models;
pub mod speech;

pub use acquirer::SystemAcquirer;
pub use camera::CommandCamera;
pub use decoder::FsImageDecoder;
pub use gallery::{Gallery, PromptGallery, QueuedGallery};
pub use models::{model_path, models_dir};
pub use speech::{CommandAnnouncer, TranscriptAnnouncer};
