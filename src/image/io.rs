//! Capture loading and template export via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::gray::{capture_to_grayscale, grayscale_to_rgba};
use crate::image::GrayImage;
use crate::util::{AdSkipError, AdSkipResult};
use std::path::Path;

fn io_error(err: impl std::fmt::Display) -> AdSkipError {
    AdSkipError::ImageIo {
        reason: err.to_string(),
    }
}

/// Converts a decoded image into a grayscale capture with the luminance weights
/// used for live frames.
pub fn gray_from_dynamic_image(img: &image::DynamicImage) -> AdSkipResult<GrayImage> {
    let rgba = img.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    capture_to_grayscale(rgba.as_raw(), width, height)
}

/// Loads an image file (PNG or JPEG) as a grayscale capture.
pub fn load_capture<P: AsRef<Path>>(path: P) -> AdSkipResult<GrayImage> {
    let img = image::open(path).map_err(io_error)?;
    gray_from_dynamic_image(&img)
}

/// Decodes an in-memory encoded frame (PNG or JPEG) as a grayscale capture.
pub fn decode_capture(bytes: &[u8]) -> AdSkipResult<GrayImage> {
    let img = image::load_from_memory(bytes).map_err(io_error)?;
    gray_from_dynamic_image(&img)
}

/// Writes a grayscale template as an opaque RGBA image.
///
/// Write failures are reported as [`AdSkipError::Storage`].
pub fn save_template_image<P: AsRef<Path>>(img: &GrayImage, path: P) -> AdSkipResult<()> {
    let buffer = image::RgbaImage::from_raw(
        img.width() as u32,
        img.height() as u32,
        grayscale_to_rgba(img),
    )
    .ok_or(AdSkipError::InvalidInput("rgba buffer does not match dimensions"))?;
    buffer.save(path).map_err(AdSkipError::storage)
}
