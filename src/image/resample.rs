//! Deterministic box resampling.
//!
//! Each destination cell averages the source pixels in
//! `[dx * w / dw, ceil((dx + 1) * w / dw))` (and likewise for rows), with at
//! least one source pixel per cell, using integer rounding
//! `(sum + count / 2) / count`. Fingerprints depend on this exact filter, so
//! any change must bump [`crate::fingerprint::FINGERPRINT_VERSION`].

use crate::image::{GrayImage, ImageView};
use crate::util::{AdSkipError, AdSkipResult};

/// Resamples `src` to `dst_width x dst_height` with a box filter.
pub fn resample_box(
    src: ImageView<'_, u8>,
    dst_width: usize,
    dst_height: usize,
) -> AdSkipResult<GrayImage> {
    if dst_width == 0 || dst_height == 0 {
        return Err(AdSkipError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }

    let cols: Vec<(usize, usize)> = (0..dst_width)
        .map(|dx| cell_bounds(dx, src.width(), dst_width))
        .collect();
    let mut out = Vec::with_capacity(dst_width * dst_height);
    for dy in 0..dst_height {
        let (y0, y1) = cell_bounds(dy, src.height(), dst_height);
        for &(x0, x1) in &cols {
            let mut sum = 0u64;
            for y in y0..y1 {
                let row = src.row(y).ok_or(AdSkipError::InvalidInput("row outside view"))?;
                sum += row[x0..x1].iter().map(|&v| v as u64).sum::<u64>();
            }
            let count = ((y1 - y0) * (x1 - x0)) as u64;
            out.push(((sum + count / 2) / count) as u8);
        }
    }
    GrayImage::new(out, dst_width, dst_height)
}

fn cell_bounds(idx: usize, src_len: usize, dst_len: usize) -> (usize, usize) {
    let start = idx * src_len / dst_len;
    let end = ((idx + 1) * src_len).div_ceil(dst_len);
    (start.min(src_len - 1), end.max(start + 1).min(src_len))
}
