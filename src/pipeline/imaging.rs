//! Decoding, resizing and JPEG encoding of derivatives

use crate::config::ENCODE_QUALITY;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

/// Image processing failure
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Both encoded derivatives of one source image
#[derive(Debug, Clone)]
pub struct Derivatives {
    pub small: Vec<u8>,
    pub thumb: Vec<u8>,
}

/// Decode raw bytes in any supported raster format
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(ImageError::Decode)
}

/// Scale `image` to fit a `max_dimension` square, keeping aspect ratio.
///
/// Images already inside the box are returned unchanged; nothing is upscaled.
pub fn fit_within(image: &DynamicImage, max_dimension: u32) -> Option<DynamicImage> {
    if image.width() <= max_dimension && image.height() <= max_dimension {
        None
    } else {
        Some(image.resize(max_dimension, max_dimension, FilterType::Lanczos3))
    }
}

/// Encode as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        .map_err(ImageError::Encode)?;
    Ok(out)
}

fn derive(image: &DynamicImage, max_dimension: u32) -> Result<Vec<u8>, ImageError> {
    match fit_within(image, max_dimension) {
        Some(resized) => encode_jpeg(&resized, ENCODE_QUALITY),
        None => encode_jpeg(image, ENCODE_QUALITY),
    }
}

/// Decode `bytes` once and produce both derivatives
pub fn render_derivatives(
    bytes: &[u8],
    small_dimension: u32,
    thumb_dimension: u32,
) -> Result<Derivatives, ImageError> {
    let image = decode(bytes)?;
    Ok(Derivatives {
        small: derive(&image, small_dimension)?,
        thumb: derive(&image, thumb_dimension)?,
    })
}
