//! Image reading and decoding port.

use candle_core::Tensor;

use crate::domain::ImageRef;

/// Port for turning an image reference into a classifier input tensor.
pub trait ImageDecoder: Send + Sync {
    /// Reads the raw encoded bytes behind a reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be read.
    fn read(&self, image: &ImageRef) -> anyhow::Result<Vec<u8>>;

    /// Decodes encoded bytes into a `(3, height, width)` f32 tensor with
    /// values in `[0, 255]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable image.
    fn decode_to_tensor(&self, bytes: &[u8]) -> anyhow::Result<Tensor>;
}
