//! Placeholder generation
//!
//! Produces the tiny blurred preview used for avatars: the image is scaled
//! down to a handful of pixels, re-encoded as JPEG and returned as base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum PlaceholderError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode placeholder: {0}")]
    Encode(String),

    #[error("Invalid placeholder width: {0}")]
    InvalidWidth(u32),
}

/// Resize to `width` pixels wide keeping the aspect ratio, encode as JPEG and
/// return standard base64.
///
/// CPU-bound; async callers should run it on the blocking pool.
pub fn generate_placeholder(bytes: &[u8], width: u32) -> Result<String, PlaceholderError> {
    if width == 0 {
        return Err(PlaceholderError::InvalidWidth(width));
    }

    let img = image::load_from_memory(bytes).map_err(|e| PlaceholderError::Decode(e.to_string()))?;

    let (orig_width, orig_height) = (img.width().max(1), img.height().max(1));
    let height = ((orig_height as f64 * width as f64 / orig_width as f64).round() as u32).max(1);

    let resized = img.resize_exact(width, height, FilterType::Triangle);
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| PlaceholderError::Encode(e.to_string()))?;

    Ok(STANDARD.encode(buffer.into_inner()))
}
