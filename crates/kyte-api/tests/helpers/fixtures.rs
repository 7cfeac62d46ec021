//! Test fixtures: real encoded images built with the `image` crate.

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use std::io::Cursor;

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("fixture should encode");
    out.into_inner()
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Jpeg)
}

pub fn create_test_webp(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, _| {
        Rgba([200, (x % 256) as u8, 40, 255])
    }));
    encode(img, ImageFormat::WebP)
}

/// A valid PNG padded to exactly `len` bytes; decoders ignore trailing data.
pub fn create_padded_png(len: usize) -> Vec<u8> {
    let mut png = create_test_png(64, 64);
    if png.len() < len {
        png.resize(len, 0);
    }
    png
}

/// Opaque bytes of the given length; only the declared content type matters
/// to the validator.
pub fn blob(len: usize) -> Vec<u8> {
    vec![0xAB; len]
}
