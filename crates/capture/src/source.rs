use image::DynamicImage;
use thiserror::Error;

use crate::digest;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Image bytes are not decodable: {0}")]
    InvalidImage(#[from] image::ImageError),
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// A decoded receipt image, immutable after acquisition. Both acquisition
/// paths (byte buffer and camera frame) normalize into this representation.
#[derive(Debug, Clone)]
pub struct RawImage {
    pixels: DynamicImage,
    digest_hex: String,
    byte_len: usize,
}

impl RawImage {
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// SHA-256 of the encoded source bytes, for log correlation and
    /// duplicate detection by callers.
    pub fn digest_hex(&self) -> &str {
        &self.digest_hex
    }

    /// Size of the encoded source buffer the image was decoded from.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

/// Acquire a receipt image from an encoded byte buffer (JPEG / PNG / WEBP / …),
/// as handed over by a file selection. Any decodable buffer is accepted.
pub fn acquire_from_bytes(data: &[u8]) -> Result<RawImage, CaptureError> {
    let pixels = image::load_from_memory(data)?;
    let digest_hex = digest::to_hex(&digest::sha256_bytes(data));
    tracing::debug!(
        bytes = data.len(),
        width = pixels.width(),
        height = pixels.height(),
        digest = %digest_hex,
        "image acquired from byte buffer"
    );
    Ok(RawImage { pixels, digest_hex, byte_len: data.len() })
}
