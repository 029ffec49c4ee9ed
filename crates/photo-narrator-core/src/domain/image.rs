//! Image references and acquisition types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque reference to image bytes owned by the platform.
///
/// The controller only holds the reference; bytes are read through the
/// decoder port and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    uri: String,
}

impl ImageRef {
    /// Creates a reference from a URI or plain path.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Creates a reference from a filesystem path.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(path.as_ref().to_string_lossy().into_owned())
    }

    /// Returns the URI as given.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the local filesystem path, stripping a `file://` scheme.
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Where the user wants the next image to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSourceKind {
    /// Pick an existing image from the library.
    Gallery,
    /// Capture a new photo.
    Camera,
}

impl fmt::Display for ImageSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gallery => f.write_str("gallery"),
            Self::Camera => f.write_str("camera"),
        }
    }
}

/// Media type filter applied by the acquirer.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaTypes {
    /// Still images only.
    Images,
    /// Videos only.
    Videos,
    /// Anything the picker offers.
    #[default]
    All,
}

/// Options passed to the acquirer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Whether the user may crop/edit before confirming.
    pub allow_editing: bool,
    /// Media type filter.
    pub media_types: MediaTypes,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            allow_editing: true,
            media_types: MediaTypes::All,
        }
    }
}

/// Outcome of an acquisition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// The user dismissed the picker or camera.
    Cancelled,
    /// An image was selected or captured.
    Selected(ImageRef),
}

impl Acquisition {
    /// Returns true if the acquisition was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_scheme_stripped() {
        let image = ImageRef::new("file:///tmp/img1.jpg");
        assert_eq!(image.to_path(), PathBuf::from("/tmp/img1.jpg"));
        assert_eq!(image.uri(), "file:///tmp/img1.jpg");
    }

    #[test]
    fn test_plain_path_kept() {
        let image = ImageRef::from_path("img1.jpg");
        assert_eq!(image.to_path(), PathBuf::from("img1.jpg"));
        assert_eq!(image.to_string(), "img1.jpg");
    }

    #[test]
    fn test_default_options_match_picker_defaults() {
        let options = AcquireOptions::default();
        assert!(options.allow_editing);
        assert_eq!(options.media_types, MediaTypes::All);
    }
}
