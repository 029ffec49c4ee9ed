//! Combined gallery and camera acquirer.

use anyhow::Result;
use photo_narrator_core::{AcquireOptions, Acquisition, ImageAcquirer};

use crate::camera::CommandCamera;
use crate::gallery::Gallery;

/// Acquirer backed by a gallery and an optional camera command.
pub struct SystemAcquirer {
    gallery: Gallery,
    camera: Option<CommandCamera>,
}

impl SystemAcquirer {
    /// Creates an acquirer without a camera.
    #[must_use]
    pub const fn new(gallery: Gallery) -> Self {
        Self {
            gallery,
            camera: None,
        }
    }

    /// Attaches a camera.
    #[must_use]
    pub fn with_camera(mut self, camera: Option<CommandCamera>) -> Self {
        self.camera = camera;
        self
    }

    /// Returns true if a camera is configured.
    #[must_use]
    pub const fn has_camera(&self) -> bool {
        self.camera.is_some()
    }
}

impl ImageAcquirer for SystemAcquirer {
    fn pick_from_library(&self, options: &AcquireOptions) -> Result<Acquisition> {
        self.gallery.pick(options)
    }

    fn capture_from_camera(&self, options: &AcquireOptions) -> Result<Acquisition> {
        match &self.camera {
            Some(camera) => camera.capture(options),
            None => anyhow::bail!("No camera command configured (set [camera] command)"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gallery::QueuedGallery;

    #[test]
    fn test_camera_missing_is_error() {
        let acquirer = SystemAcquirer::new(Gallery::Queued(QueuedGallery::new(vec![])));
        assert!(!acquirer.has_camera());
        assert!(acquirer
            .capture_from_camera(&AcquireOptions::default())
            .is_err());
    }

    #[test]
    fn test_empty_gallery_cancels() {
        let acquirer = SystemAcquirer::new(Gallery::Queued(QueuedGallery::new(vec![])));
        let result = acquirer
            .pick_from_library(&AcquireOptions::default())
            .unwrap();
        assert!(result.is_cancelled());
    }
}
