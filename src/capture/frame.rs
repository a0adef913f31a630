//! Frame data structures for decoded capture files

use image::{ImageError, ImageReader};
use std::path::Path;

use crate::error::{DetectorError, Result};

/// A capture decoded into memory
#[derive(Debug)]
pub struct CaptureImage {
    /// Raw RGB pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl CaptureImage {
    /// Create a capture image from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    /// Decode an image file of any supported format into RGB
    ///
    /// The format is sniffed from the file contents; the extension only
    /// decides eligibility, not the decoder.
    pub fn open(path: &Path) -> Result<Self> {
        let decode_error = |source: ImageError| DetectorError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let decoded = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| decode_error(ImageError::IoError(e)))?
            .decode()
            .map_err(decode_error)?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self::new(rgb.into_raw(), width, height))
    }

    /// Get image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
