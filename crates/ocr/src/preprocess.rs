use image::imageops::FilterType;
use image::{GrayImage, ImageBuffer, ImageFormat, Luma};
use std::io::Cursor;

use jeonpyo_capture::RawImage;

/// Longest side of an image after normalization. Receipts photographed at
/// full sensor resolution gain nothing for recognition past this size.
pub const MAX_DIMENSION: u32 = 1200;

const CONTRAST_GAIN: f32 = 1.2;
const BRIGHTNESS_GAIN: f32 = 1.1;

/// Grayscale image normalized for recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    image: GrayImage,
}

impl ProcessedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Encode as PNG for engines that take encoded bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        self.image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }
}

/// Normalize a captured image for recognition: downscale so the longest
/// side is at most [`MAX_DIMENSION`] (never upscale), convert to grayscale
/// with the BT.601 weights, then boost contrast and brightness. Both gains
/// clamp to the 0..=255 range before the next step.
pub fn preprocess(raw: &RawImage) -> ProcessedImage {
    let longest = raw.width().max(raw.height());
    let scaled = if longest > MAX_DIMENSION {
        tracing::debug!(
            width = raw.width(),
            height = raw.height(),
            "downscaling for recognition"
        );
        raw.pixels().resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        raw.pixels().clone()
    };

    let rgb = scaled.to_rgb8();
    let image = ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        let contrasted = (luma * CONTRAST_GAIN).clamp(0.0, 255.0);
        let brightened = (contrasted * BRIGHTNESS_GAIN).clamp(0.0, 255.0);
        Luma([brightened.round() as u8])
    });

    ProcessedImage { image }
}
