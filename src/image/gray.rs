//! RGBA to luminance conversion.

use crate::image::GrayImage;
use crate::util::{AdSkipError, AdSkipResult};

/// Converts a row-major RGBA capture into a grayscale buffer.
///
/// Each pixel becomes `round(0.299 R + 0.587 G + 0.114 B)`; alpha is ignored.
pub fn capture_to_grayscale(rgba: &[u8], width: usize, height: usize) -> AdSkipResult<GrayImage> {
    if width == 0 || height == 0 {
        return Err(AdSkipError::InvalidDimensions { width, height });
    }
    let needed = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or(AdSkipError::InvalidDimensions { width, height })?;
    if rgba.len() != needed {
        return Err(AdSkipError::BufferLength {
            needed,
            got: rgba.len(),
        });
    }

    let pixels = rgba.chunks_exact(4).map(|px| luma(px[0], px[1], px[2])).collect();
    GrayImage::new(pixels, width, height)
}

/// Expands a grayscale buffer back to opaque RGBA.
pub fn grayscale_to_rgba(image: &GrayImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.pixels().len() * 4);
    for &value in image.pixels() {
        out.extend_from_slice(&[value, value, value, 255]);
    }
    out
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    y.round().min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::{capture_to_grayscale, grayscale_to_rgba};
    use crate::util::AdSkipError;

    #[test]
    fn uses_rec601_weights() {
        let rgba = [
            255, 0, 0, 255, // red
            0, 255, 0, 0, // green, transparent
            0, 0, 255, 255, // blue
            255, 255, 255, 255, // white
        ];
        let gray = capture_to_grayscale(&rgba, 2, 2).unwrap();
        assert_eq!(gray.pixels(), &[76, 150, 29, 255]);
    }

    #[test]
    fn rejects_partial_pixels() {
        let err = capture_to_grayscale(&[0u8; 7], 2, 1).err().unwrap();
        assert_eq!(err, AdSkipError::BufferLength { needed: 8, got: 7 });
    }

    #[test]
    fn rgba_expansion_is_opaque_gray() {
        let gray = capture_to_grayscale(&[10, 10, 10, 0], 1, 1).unwrap();
        assert_eq!(grayscale_to_rgba(&gray), vec![10, 10, 10, 255]);
    }
}
