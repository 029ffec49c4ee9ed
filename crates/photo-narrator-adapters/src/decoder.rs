//! Filesystem adapter for reading and decoding images.

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use image::GenericImageView;
use photo_narrator_core::{ImageDecoder, ImageRef};
use tracing::debug;

/// Reads images from the local filesystem and decodes them with `image`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageDecoder;

impl FsImageDecoder {
    /// Creates a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ImageDecoder for FsImageDecoder {
    fn read(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let path = image.to_path();
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }

    fn decode_to_tensor(&self, bytes: &[u8]) -> Result<Tensor> {
        let decoded = image::load_from_memory(bytes).context("Failed to decode image")?;
        let (width, height) = decoded.dimensions();
        let rgb = decoded.to_rgb8();

        let data: Vec<f32> = rgb.into_raw().into_iter().map(f32::from).collect();

        // (H, W, 3) interleaved -> (3, H, W) planar
        let tensor = Tensor::from_vec(data, (height as usize, width as usize, 3), &Device::Cpu)?
            .permute((2, 0, 1))?
            .contiguous()?;
        debug!("Decoded {width}x{height} image");
        Ok(tensor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    use super::*;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |_, _| Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_jpeg_planar() {
        let tensor = FsImageDecoder::new()
            .decode_to_tensor(&jpeg_bytes(16, 8))
            .unwrap();
        assert_eq!(tensor.dims(), &[3, 8, 16]);

        let red = tensor.get(0).unwrap().mean_all().unwrap().to_scalar::<f32>().unwrap();
        let blue = tensor.get(2).unwrap().mean_all().unwrap().to_scalar::<f32>().unwrap();
        assert!(red > 150.0, "red channel mean {red}");
        assert!(blue < 60.0, "blue channel mean {blue}");
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(FsImageDecoder::new().decode_to_tensor(b"not an image").is_err());
    }

    #[test]
    fn test_read_missing_file_fails() {
        let err = FsImageDecoder::new()
            .read(&ImageRef::new("/nonexistent/img1.jpg"))
            .unwrap_err();
        assert!(err.to_string().contains("img1.jpg"));
    }

    #[test]
    fn test_read_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img1.jpg");
        std::fs::write(&path, jpeg_bytes(4, 4)).unwrap();

        let uri = format!("file://{}", path.display());
        let bytes = FsImageDecoder::new().read(&ImageRef::new(uri)).unwrap();
        assert!(!bytes.is_empty());
    }
}
