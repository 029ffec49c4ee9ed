//! Image acquisition port (gallery picker and camera).

use crate::domain::{AcquireOptions, Acquisition};

/// Port for obtaining an image from the user.
pub trait ImageAcquirer: Send + Sync {
    /// Lets the user pick an existing image.
    ///
    /// # Errors
    ///
    /// Returns an error if the picker itself fails. Dismissal is
    /// [`Acquisition::Cancelled`], not an error.
    fn pick_from_library(&self, options: &AcquireOptions) -> anyhow::Result<Acquisition>;

    /// Lets the user capture a new photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera fails. Dismissal is
    /// [`Acquisition::Cancelled`], not an error.
    fn capture_from_camera(&self, options: &AcquireOptions) -> anyhow::Result<Acquisition>;
}
